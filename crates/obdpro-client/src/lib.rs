//! obdpro-client - HTTP clients for the diagnostic dashboard
//!
//! - [`HttpBridge`] talks to the hardware bridge (`/api/data`, `/api/uds`)
//!   and implements [`obdpro_core::BridgeTransport`]
//! - [`HttpAssistant`] posts prompts to a completion endpoint and implements
//!   [`obdpro_core::AssistantBackend`]
//!
//! # Example
//!
//! ```ignore
//! use obdpro_client::HttpBridge;
//!
//! let bridge = HttpBridge::new("http://192.168.4.1")?;
//! let reply = bridge.uds_request("22", "F1 90").await?;
//! println!("{:?}", reply.data);
//! ```

pub mod assistant;
pub mod bridge;
pub mod error;
pub mod testing;

pub use assistant::HttpAssistant;
pub use bridge::HttpBridge;
pub use error::{ClientError, Result};
