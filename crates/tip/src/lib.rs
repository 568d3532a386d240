#![allow(dead_code)]

pub mod errors;
pub mod layout;
pub mod model;
pub mod ports;
pub mod presenter;

pub use errors::TipError;
pub use model::{
    Interaction, InteractionKind, InteractionTarget, OverlayPadding, TipFrame, TipInfo,
    TipReaction, TipTimings,
};
pub use ports::{MemorySurface, TipSurface};
pub use presenter::Tip;
