//! Per-hop guarantee accounting.
//!
//! The delay and idle-slope tables are the inputs; every registered
//! stream's [`LocalStream`]s are the outputs. Replacing or merging a
//! table recomputes every stream in place.
//!
//! [`LocalStream`]: crate::stream::LocalStream

use super::{LinkTable, Topology, TopologyError};
use crate::{
    link::{Link, LinkId},
    measure::PerPriority,
    stream::{Stream, StreamId},
};
use tracing::debug;

impl Topology {
    /// The max delays (per-hop guarantees) per link and per priority, in
    /// nanoseconds.
    pub fn max_delays(&self) -> Option<&LinkTable> {
        self.max_delays.as_ref()
    }

    /// The max idle slopes per link and per priority.
    pub fn max_idle_slopes(&self) -> Option<&LinkTable> {
        self.max_idle_slopes.as_ref()
    }

    /// The max queue sizes per link and per priority.
    pub fn max_queue_sizes(&self) -> Option<&LinkTable> {
        self.max_queue_sizes.as_ref()
    }

    /// Merge `guarantees` into the max delay table, creating the table if
    /// needed, then recompute the accumulated latencies of every stream.
    ///
    /// # Errors
    ///
    /// [`TopologyError::UnknownLink`] if any key is not a link of this
    /// topology; the table is left untouched in that case.
    pub fn update_guarantees_dict(&mut self, guarantees: LinkTable) -> Result<(), TopologyError> {
        for link in guarantees.keys() {
            self.try_link(*link)?;
        }

        debug!(links = guarantees.len(), "updating max delays");
        self.max_delays
            .get_or_insert_with(LinkTable::new)
            .extend(guarantees);
        self.update_all_latencies();

        Ok(())
    }

    /// Set the same per-priority max delays on every directed link.
    pub fn update_guarantees_all_links(&mut self, guarantees: PerPriority<f64>) {
        let table: LinkTable = self.links().map(|(id, _)| (id, guarantees)).collect();
        self.max_delays.get_or_insert_with(LinkTable::new).extend(table);
        self.update_all_latencies();
    }

    /// Set the per-priority max delays of a single directed link.
    pub fn update_guarantees(
        &mut self,
        link: LinkId,
        guarantees: PerPriority<f64>,
    ) -> Result<(), TopologyError> {
        self.update_guarantees_dict(LinkTable::from([(link, guarantees)]))
    }

    /// Replace the idle slope table with the same per-priority values on
    /// every directed link, then reassign every stream's idle slopes.
    pub fn update_idle_slopes_all_links(&mut self, max_idle_slopes: PerPriority<f64>) {
        let table = self.links().map(|(id, _)| (id, max_idle_slopes)).collect();
        self.max_idle_slopes = Some(table);
        self.update_all_idle_slopes();
    }

    /// Set the per-priority idle slopes of a single directed link, keeping
    /// the other entries.
    pub fn update_idle_slopes(
        &mut self,
        link: LinkId,
        max_idle_slopes: PerPriority<f64>,
    ) -> Result<(), TopologyError> {
        self.try_link(link)?;
        self.max_idle_slopes
            .get_or_insert_with(LinkTable::new)
            .insert(link, max_idle_slopes);
        self.update_all_idle_slopes();
        Ok(())
    }

    /// Replace the queue size table. Nothing is derived from it.
    pub fn update_queue_sizes_all_links(&mut self, max_queue_sizes: PerPriority<f64>) {
        let table = self.links().map(|(id, _)| (id, max_queue_sizes)).collect();
        self.max_queue_sizes = Some(table);
    }

    /// Recompute whatever the configured tables allow for one stream.
    pub(super) fn update_stream(&mut self, id: StreamId) {
        let Some(stream) = self.streams.get_mut(&id) else {
            return;
        };
        if let Some(max_delays) = &self.max_delays {
            update_acc_latencies(&self.links, max_delays, stream);
        }
        if let Some(max_idle_slopes) = &self.max_idle_slopes {
            update_idle_slope_stream(max_idle_slopes, stream);
        }
    }

    fn update_all_latencies(&mut self) {
        let Some(max_delays) = &self.max_delays else {
            return;
        };
        for stream in self.streams.values_mut() {
            update_acc_latencies(&self.links, max_delays, stream);
        }
    }

    fn update_all_idle_slopes(&mut self) {
        let Some(max_idle_slopes) = &self.max_idle_slopes else {
            return;
        };
        for stream in self.streams.values_mut() {
            update_idle_slope_stream(max_idle_slopes, stream);
        }
    }
}

/// Prefix sums along the path, the first hop at `0`.
///
/// A link without an entry in `max_delays` has no bound: it makes every
/// later hop `+∞`.
fn update_acc_latencies(links: &[Link], max_delays: &LinkTable, stream: &mut Stream) {
    let priority = stream.priority();
    let min_frame_size = stream.min_frame_size();

    let per_hop: Vec<(f64, f64)> = stream
        .path()
        .iter()
        .map(|id| {
            let max = max_delays
                .get(id)
                .map_or(f64::INFINITY, |delays| delays[priority]);
            let min = links
                .get(id.index())
                .map_or(0.0, |link| link.bandwidth().serialization_ns(min_frame_size));
            (max, min)
        })
        .collect();

    let mut acc_max = 0.0;
    let mut acc_min = 0.0;
    for (local, (max, min)) in stream.local_streams_mut().iter_mut().zip(per_hop) {
        local.set_latencies(acc_max, acc_min);
        acc_max += max;
        acc_min += min;
    }
}

fn update_idle_slope_stream(max_idle_slopes: &LinkTable, stream: &mut Stream) {
    let priority = stream.priority();
    let slopes: Vec<Option<f64>> = stream
        .path()
        .iter()
        .map(|id| max_idle_slopes.get(id).map(|slopes| slopes[priority]))
        .collect();

    for (local, slope) in stream.local_streams_mut().iter_mut().zip(slopes) {
        local.set_max_idle_slope(slope);
    }
}
