//! Policy engine: independent rules composed into suites.
//!
//! A [`Policy`] inspects a context and lazily yields zero or more [`Issue`]s.
//! A [`PolicySuite`] runs every member (no short-circuit) and folds the issues
//! into a [`Decision`]. Adding a rule means writing a new `Policy` impl; the
//! suite and existing rules never change.

use crate::issue::{Decision, Issue};

/// Lazy, finite sequence of issues borrowed from one evaluation.
pub type Issues<'a> = Box<dyn Iterator<Item = Issue> + 'a>;

/// A rule over a context of type `Ctx`.
///
/// Implementations must be pure: no IO, no mutation of `ctx`, no state shared
/// between calls. Calling `evaluate` twice yields two independent sequences.
pub trait Policy<Ctx: ?Sized>: Send + Sync {
    fn evaluate<'a>(&'a self, ctx: &'a Ctx) -> Issues<'a>;
}

/// Issues for a rule that finds at most one problem. `check` runs on first pull.
pub fn at_most_one<'a, F>(check: F) -> Issues<'a>
where
    F: FnOnce() -> Option<Issue> + 'a,
{
    Box::new(std::iter::once_with(check).flatten())
}

/// Adapter turning a closure into a policy.
pub struct FnPolicy<F>(F);

/// Build a single-issue policy from a closure.
pub fn policy_fn<Ctx, F>(check: F) -> FnPolicy<F>
where
    Ctx: ?Sized,
    F: Fn(&Ctx) -> Option<Issue> + Send + Sync,
{
    FnPolicy(check)
}

impl<Ctx, F> Policy<Ctx> for FnPolicy<F>
where
    Ctx: ?Sized,
    F: Fn(&Ctx) -> Option<Issue> + Send + Sync,
{
    fn evaluate<'a>(&'a self, ctx: &'a Ctx) -> Issues<'a> {
        at_most_one(move || (self.0)(ctx))
    }
}

/// Ordered collection of policies, itself a policy.
///
/// Order only affects the order issues are reported in.
pub struct PolicySuite<Ctx: ?Sized> {
    policies: Vec<Box<dyn Policy<Ctx>>>,
}

impl<Ctx: ?Sized> Default for PolicySuite<Ctx> {
    fn default() -> Self {
        Self { policies: Vec::new() }
    }
}

impl<Ctx: ?Sized> PolicySuite<Ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with<P>(mut self, policy: P) -> Self
    where
        P: Policy<Ctx> + 'static,
    {
        self.push(policy);
        self
    }

    pub fn push<P>(&mut self, policy: P)
    where
        P: Policy<Ctx> + 'static,
    {
        self.policies.push(Box::new(policy));
    }

    pub fn push_boxed(&mut self, policy: Box<dyn Policy<Ctx>>) {
        self.policies.push(policy);
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Run every policy against `ctx` and aggregate the result.
    pub fn decide(&self, ctx: &Ctx) -> Decision {
        self.evaluate(ctx).collect()
    }
}

impl<Ctx: ?Sized> Policy<Ctx> for PolicySuite<Ctx> {
    fn evaluate<'a>(&'a self, ctx: &'a Ctx) -> Issues<'a> {
        Box::new(self.policies.iter().flat_map(move |p| p.evaluate(ctx)))
    }
}

impl<Ctx: ?Sized> core::fmt::Debug for PolicySuite<Ctx> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PolicySuite")
            .field("policies", &self.policies.len())
            .finish()
    }
}
