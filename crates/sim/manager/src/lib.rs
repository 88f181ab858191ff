//! SIM/USIM session management
//!
//! A [`Sim`] tracks one modem's SIM slot. When a card is reported inserted it
//! runs the bring-up sequence (identifiers, languages, password state, card
//! phase, service tables, dialling restrictions, IMSI) and then keeps
//! subscriber data current until the card is removed.
//!
//! The session talks to the card through two collaborators:
//!
//! - [`SimFiles`] reads and writes elementary files
//! - [`SimDriver`] performs modem-side operations such as IMSI retrieval and
//!   password handling
//!
//! Changes are published on a broadcast channel obtained from
//! [`Sim::subscribe`]; [`Sim::properties`] returns a snapshot.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use nexum_sim::prelude::*;
//!
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let sim = Sim::create(Rc::new(driver), Rc::new(files), SimConfig::default());
//!     let mut events = sim.subscribe();
//!     sim.inserted_notify(true);
//!     while let Ok(event) = events.recv().await {
//!         if event == SimEvent::StateChanged(SimState::Ready) {
//!             break;
//!         }
//!     }
//!     println!("IMSI: {:?}", sim.imsi());
//! }).await;
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub use nexum_sim_core as sim_core;

mod bringup;
mod config;
mod driver;
mod error;
mod event;
mod files;
mod icon;
mod numbers;
mod pending;
mod pin;
mod registry;
mod sim;
mod state;

pub use config::SimConfig;
pub use driver::{Capabilities, Capability, RetryTable, SimDriver};
pub use error::{Result, SimError, TransportError};
pub use event::{Property, ServiceNumber, SimEvent, SimProperties, SimState};
pub use files::{FileData, FileInfo, FileWatch, SimFiles};
pub use pending::RequestKind;
pub use registry::{DriverFactory, DriverRegistry};
pub use sim::Sim;

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        Capabilities, Capability, DriverRegistry, FileData, FileInfo, FileWatch, Property,
        RetryTable, ServiceNumber, Sim, SimConfig, SimDriver, SimError, SimEvent, SimFiles,
        SimProperties, SimState, TransportError,
    };
    pub use nexum_sim_core::{FileId, FileStructure, PasswordKind, PhoneNumber};
}
