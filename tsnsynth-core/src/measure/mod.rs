mod bandwidth;
mod priority;

pub use self::{
    bandwidth::{Bandwidth, BandwidthParseError},
    priority::{PerPriority, PerPriorityParseError, Priority, PriorityError},
};
