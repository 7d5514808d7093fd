//! Typed skill specification model and decision-rule normalization.

pub mod model;
pub mod rules;

pub use model::{
    ContentLanguage, ContextInfo, DomainType, EdgeCase, ExecutionStep, FailureMode, InputDomain,
    InputSpec, InputType, MetaConfig, OutputContract, OutputFormat, Scenario, SkillMetadata,
    SkillReference, SkillSpec, SpecVersion, is_kebab_case, is_semver, is_snake_case,
    is_upper_snake_case,
};
pub use rules::{
    ConflictResolution, DecisionRule, DecisionRules, MatchStrategy, NormalizeError, RuleAction,
    RuleCondition, RuleConfig, normalize,
};
