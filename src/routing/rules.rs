//! Ordered rule table for inbound turns
//!
//! Rules are evaluated in list order and the first match wins. Precedence is
//! therefore the position in [`TurnRouter::standard`]: first contact, then
//! name capture, then reset, then the FAQ keyword, then selection mode.
//! Anything left over goes to the free-text fallback.

use serde::{Deserialize, Serialize};

use crate::aggregate::{DialogState, Session};
use crate::value_objects::Keyword;

/// What a turn will do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// No session yet: create one and ask for a name
    FirstContact,
    /// Session has no name: the whole message is the name
    CaptureName,
    /// "reset"/"exit": drop the session
    Reset,
    /// "faq"/"faqs": list questions and enter selection mode
    ListFaqs,
    /// In selection mode: interpret the message as a number
    SelectFaq,
    /// Hand the text to the free-text responder
    Fallback,
}

/// Input a rule is matched against
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub session: Option<&'a Session>,
    pub text: &'a str,
}

impl<'a> RouteContext<'a> {
    pub fn new(session: Option<&'a Session>, text: &'a str) -> Self {
        Self { session, text }
    }

    fn keyword(&self) -> Option<Keyword> {
        Keyword::parse(self.text)
    }
}

/// A single entry in the rule table
pub trait TurnRule: Send + Sync {
    /// The rule this entry resolves to
    fn rule(&self) -> Rule;

    /// Whether this entry claims the turn
    fn matches(&self, ctx: &RouteContext<'_>) -> bool;

    /// Name used in logs
    fn name(&self) -> &'static str;
}

pub struct FirstContactRule;

impl TurnRule for FirstContactRule {
    fn rule(&self) -> Rule {
        Rule::FirstContact
    }

    fn matches(&self, ctx: &RouteContext<'_>) -> bool {
        ctx.session.is_none()
    }

    fn name(&self) -> &'static str {
        "first_contact"
    }
}

pub struct CaptureNameRule;

impl TurnRule for CaptureNameRule {
    fn rule(&self) -> Rule {
        Rule::CaptureName
    }

    fn matches(&self, ctx: &RouteContext<'_>) -> bool {
        ctx.session.is_some_and(Session::is_awaiting_name)
    }

    fn name(&self) -> &'static str {
        "capture_name"
    }
}

pub struct ResetRule;

impl TurnRule for ResetRule {
    fn rule(&self) -> Rule {
        Rule::Reset
    }

    fn matches(&self, ctx: &RouteContext<'_>) -> bool {
        ctx.keyword() == Some(Keyword::Reset)
    }

    fn name(&self) -> &'static str {
        "reset"
    }
}

pub struct FaqListRule;

impl TurnRule for FaqListRule {
    fn rule(&self) -> Rule {
        Rule::ListFaqs
    }

    fn matches(&self, ctx: &RouteContext<'_>) -> bool {
        ctx.keyword() == Some(Keyword::Faq)
    }

    fn name(&self) -> &'static str {
        "faq_list"
    }
}

pub struct FaqSelectionRule;

impl TurnRule for FaqSelectionRule {
    fn rule(&self) -> Rule {
        Rule::SelectFaq
    }

    fn matches(&self, ctx: &RouteContext<'_>) -> bool {
        ctx.session
            .is_some_and(|s| matches!(s.state(), DialogState::FaqSelection { faqs } if !faqs.is_empty()))
    }

    fn name(&self) -> &'static str {
        "faq_selection"
    }
}

/// Priority-ordered rule table
pub struct TurnRouter {
    rules: Vec<Box<dyn TurnRule>>,
}

impl TurnRouter {
    /// The standard table, in precedence order
    pub fn standard() -> Self {
        Self {
            rules: vec![
                Box::new(FirstContactRule),
                Box::new(CaptureNameRule),
                Box::new(ResetRule),
                Box::new(FaqListRule),
                Box::new(FaqSelectionRule),
            ],
        }
    }

    /// Pick the rule for this turn
    pub fn route(&self, ctx: &RouteContext<'_>) -> Rule {
        self.rules
            .iter()
            .find(|r| r.matches(ctx))
            .map(|r| {
                tracing::debug!(rule = r.name(), "turn routed");
                r.rule()
            })
            .unwrap_or(Rule::Fallback)
    }

    /// Rule names in evaluation order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl Default for TurnRouter {
    fn default() -> Self {
        Self::standard()
    }
}
