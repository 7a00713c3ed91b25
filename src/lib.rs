//! ARK workshop mod installer
//!
//! The format layer ([`archive`], [`descriptor`], [`ue4`]) turns a downloaded
//! workshop item into what a dedicated server loads, the [`install`] and
//! [`steamcmd`] modules drive it for whole items.
pub mod archive;
pub mod descriptor;
pub mod error;
pub mod install;
pub mod steamcmd;
pub mod ue4;

mod buf;
mod output;

pub use error::{Corruption, Error};
