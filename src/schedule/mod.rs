//! Deciding when an occurrence is expected and which notification is due.

use chrono::NaiveDate;
use derive_new::new;
use serde::Deserialize;

use crate::model::{EventKind, MarkerKey, NotificationState, PredictedOccurrence};
use crate::time::{ReferenceZone, Timestamp};

pub use reconcile::*;
pub use scheduler::*;

mod reconcile;
mod scheduler;
