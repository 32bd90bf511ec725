//! Turn routing: decides which rule handles an inbound message

pub mod rules;

pub use rules::{
    CaptureNameRule, FaqListRule, FaqSelectionRule, FirstContactRule, ResetRule, Rule,
    RouteContext, TurnRouter, TurnRule,
};
