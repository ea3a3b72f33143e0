//! Agents module - capabilities that answer customer tasks.
//!
//! Every agent implements [`AgentCapability`]; the [`AgentRegistry`] maps
//! task categories to them.
//!
//! | Agent     | Categories                                                       |
//! |-----------|------------------------------------------------------------------|
//! | Support   | support query, troubleshooting, account, complaint, subscription |
//! | Marketing | content, analytics, segmentation                                 |
//! | General   | fallback for everything else                                     |

mod capability;
mod general;
mod marketing;
pub mod prompt;
mod registry;
mod support;

pub use capability::{AgentCapability, AgentContext, AgentError, AgentResponse};
pub use general::GeneralAgent;
pub use marketing::MarketingAgent;
pub use prompt::ModelSettings;
pub use registry::{AgentRegistry, RegistryError};
pub use support::SupportAgent;

pub use crate::domain::conversation::AgentKind;
