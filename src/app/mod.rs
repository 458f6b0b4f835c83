mod generation_dispatcher;
mod generation_gateway;
mod setup_check;

pub use generation_dispatcher::{GenerationDispatcher, PendingGeneration};
pub use generation_gateway::GenerationGateway;
pub use setup_check::{CheckSection, SetupCheck, SetupInspector, SetupReport, mask_secret};
