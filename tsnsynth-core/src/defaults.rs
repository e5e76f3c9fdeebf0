use crate::measure::Bandwidth;

/// Ethernet preamble and start-of-frame delimiter, in bits.
pub const PREAMBLE: u64 = 8 * 8;

/// Ethernet inter-packet gap, in bits.
pub const IPG: u64 = 12 * 8;

/// Fixed per-frame overhead accounted in every [`Stream`] burst.
///
/// ```
/// # use tsnsynth_core::defaults::*;
/// assert_eq!(FRAME_OVERHEAD, 160);
/// ```
///
/// [`Stream`]: crate::stream::Stream
pub const FRAME_OVERHEAD: u64 = PREAMBLE + IPG;

/// Smallest Ethernet frame (64 bytes), in bits, excluding overhead.
///
/// This is the frame size used by the stream factory for the
/// serialization-time lower bound of every stream.
pub const MIN_FRAME_SIZE: u64 = 64 * 8;

/// Largest Ethernet payload frame (1500 bytes), in bits, excluding overhead.
pub const MAX_FRAME_SIZE: u64 = 1_500 * 8;

/// Number of sources tried by the stream factory before giving up on a
/// requested stream.
pub const MAX_ENDPOINT_ATTEMPTS: usize = 100;

/// Number of "no suitable pair" warnings logged by a single call to the
/// stream factory, the last of them announcing that further ones are
/// suppressed.
pub const MAX_PRINTED_WARNINGS: usize = 5;

/// Seed used by [`Context::new`].
///
/// [`Context::new`]: crate::Context::new
pub const DEFAULT_SEED: u64 = 0;

/// Default bandwidth of the main line of generated topologies (1 Gbit/s).
///
/// ```
/// # use tsnsynth_core::defaults::*;
/// assert_eq!(DEFAULT_MAIN_LINK_SPEED.to_string(), "1gbps");
/// ```
pub const DEFAULT_MAIN_LINK_SPEED: Bandwidth = Bandwidth::new(1_000_000_000);

/// Default bandwidth of branch and host links (100 Mbit/s).
///
/// ```
/// # use tsnsynth_core::defaults::*;
/// assert_eq!(DEFAULT_BRANCH_LINK_SPEED.to_string(), "100mbps");
/// ```
pub const DEFAULT_BRANCH_LINK_SPEED: Bandwidth = Bandwidth::new(100_000_000);

/// Prefix given to the nodes of the first topology by the composer.
pub const FIRST_TOPOLOGY_PREFIX: &str = "t1_";

/// Prefix given to the nodes of the second topology by the composer.
pub const SECOND_TOPOLOGY_PREFIX: &str = "t2_";
