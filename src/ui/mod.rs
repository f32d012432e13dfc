pub mod plan_view;
pub mod wizard;

pub use plan_view::{render_plan, render_rules};
pub use wizard::PublishWizard;
