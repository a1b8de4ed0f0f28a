use chrono::NaiveDate;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

pub use event::*;
pub use kind::*;
pub use marker::*;
pub use occurrence::*;
pub use state::*;

mod event;
mod kind;
mod marker;
mod occurrence;
mod state;
