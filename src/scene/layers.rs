//! Layer membership masks.
//!
//! Every node carries a 32-channel bitmask used to group objects for
//! selective rendering. A camera or an effect holds its own mask and a node
//! participates when the two masks intersect. Channel 0 is enabled by
//! default, so freshly created nodes are visible to a default camera.

/// A 32-channel membership bitmask.
///
/// Channels are numbered `0..32`. The mask can either be pinned to exactly
/// one channel with [`set`](Self::set) or combined channel-by-channel with
/// [`enable`](Self::enable) / [`disable`](Self::disable) /
/// [`toggle`](Self::toggle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layers {
    mask: u32,
}

impl Default for Layers {
    fn default() -> Self {
        // Channel 0 on, matching the default camera mask.
        Self { mask: 1 }
    }
}

impl Layers {
    /// Creates a mask with only channel 0 enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mask with no channels enabled.
    #[must_use]
    pub fn empty() -> Self {
        Self { mask: 0 }
    }

    /// Replaces the mask so that exactly `channel` is enabled.
    pub fn set(&mut self, channel: u32) {
        debug_assert!(channel < 32, "layer channel out of range: {channel}");
        self.mask = 1 << channel;
    }

    /// Enables `channel`, leaving other channels untouched.
    pub fn enable(&mut self, channel: u32) {
        debug_assert!(channel < 32, "layer channel out of range: {channel}");
        self.mask |= 1 << channel;
    }

    /// Disables `channel`, leaving other channels untouched.
    pub fn disable(&mut self, channel: u32) {
        debug_assert!(channel < 32, "layer channel out of range: {channel}");
        self.mask &= !(1 << channel);
    }

    /// Flips `channel`.
    pub fn toggle(&mut self, channel: u32) {
        debug_assert!(channel < 32, "layer channel out of range: {channel}");
        self.mask ^= 1 << channel;
    }

    /// Returns `true` when `channel` is enabled in this mask.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, channel: u32) -> bool {
        debug_assert!(channel < 32, "layer channel out of range: {channel}");
        self.mask & (1 << channel) != 0
    }

    /// Returns `true` when the two masks share at least one channel.
    #[inline]
    #[must_use]
    pub fn test(&self, other: Layers) -> bool {
        self.mask & other.mask != 0
    }

    /// Returns the raw bitmask.
    #[inline]
    #[must_use]
    pub fn bits(&self) -> u32 {
        self.mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_channel_zero() {
        let layers = Layers::new();
        assert!(layers.is_enabled(0));
        assert!(!layers.is_enabled(1));
    }

    #[test]
    fn test_set_replaces_mask() {
        let mut layers = Layers::new();
        layers.set(3);
        assert!(!layers.is_enabled(0));
        assert!(layers.is_enabled(3));
    }

    #[test]
    fn test_enable_disable_toggle() {
        let mut layers = Layers::new();
        layers.enable(1);
        assert!(layers.is_enabled(0) && layers.is_enabled(1));

        layers.disable(0);
        assert!(!layers.is_enabled(0));

        layers.toggle(1);
        assert!(!layers.is_enabled(1));
        layers.toggle(1);
        assert!(layers.is_enabled(1));
    }

    #[test]
    fn test_mask_intersection() {
        let mut bloom = Layers::empty();
        bloom.set(1);

        let mut node = Layers::new();
        assert!(!node.test(bloom), "fresh node must not intersect the bloom mask");

        node.enable(1);
        assert!(node.test(bloom));

        node.disable(1);
        assert!(!node.test(bloom));
    }
}
