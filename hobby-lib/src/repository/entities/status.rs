use clap::ValueEnum;
use strum::{Display, EnumIter, EnumString};

/// How far along a miniature is.
///
/// Variants are listed in the order they happen on the painting table, which is also the order
/// they are shown in. Nothing in the query logic depends on that order.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    ValueEnum,
)]
#[strum(ascii_case_insensitive)]
pub enum Status {
    #[default]
    #[strum(to_string = "Unbuilt")]
    Unbuilt,
    #[strum(to_string = "Built")]
    Built,
    #[strum(to_string = "Primed")]
    Primed,
    #[strum(to_string = "Work in Progress", serialize = "wip")]
    Wip,
    #[strum(to_string = "Complete")]
    Complete,
}

impl Status {
    /// The label shown to the user.
    pub fn display_name(&self) -> String {
        self.to_string()
    }

    pub fn is_complete(&self) -> bool {
        *self == Status::Complete
    }
}
