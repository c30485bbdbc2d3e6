//! Touch-button input: the sensing interface and rising-edge navigation.

/// The two navigation buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchButton {
    /// Steps back one page.
    Button0 = 0,
    /// Steps forward one page.
    Button1 = 1,
}

/// A touch front end that scans in the background and is processed from the
/// main loop.
///
/// Implementations may complete the scan from an interrupt, but only
/// [`is_busy`](TouchSensor::is_busy) may observe that; everything else runs on
/// the main loop.
pub trait TouchSensor {
    /// Start a scan of every widget.
    fn scan_all_widgets(&mut self);

    /// `true` while a scan is still running.
    fn is_busy(&self) -> bool;

    /// Turn the finished scan into widget states.
    fn process_all_widgets(&mut self);

    /// Whether `button` was touched in the last processed scan.
    fn is_sensor_active(&self, button: TouchButton) -> bool;
}

/// Page navigation request produced by a button edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Navigation {
    Previous,
    Next,
}

/// Turns per-scan button states into navigation on inactive → active edges.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    previous: [bool; 2],
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self {
            previous: [false; 2],
        }
    }

    /// Feed the states of one scan.
    ///
    /// Button 0 wins when both buttons rise in the same scan. Both previous
    /// states are updated regardless, so the losing edge is dropped.
    pub fn update(&mut self, button0: bool, button1: bool) -> Option<Navigation> {
        let [prev0, prev1] = self.previous;
        self.previous = [button0, button1];

        if button0 && !prev0 {
            Some(Navigation::Previous)
        } else if button1 && !prev1 {
            Some(Navigation::Next)
        } else {
            None
        }
    }

    /// Sample both buttons from a processed scan.
    pub fn poll(&mut self, sensor: &impl TouchSensor) -> Option<Navigation> {
        self.update(
            sensor.is_sensor_active(TouchButton::Button0),
            sensor.is_sensor_active(TouchButton::Button1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rising_edges_navigate() {
        let mut edges = EdgeDetector::new();
        assert_eq!(edges.update(false, false), None);
        assert_eq!(edges.update(false, true), Some(Navigation::Next));
        assert_eq!(edges.update(false, true), None);
        assert_eq!(edges.update(false, false), None);
        assert_eq!(edges.update(true, false), Some(Navigation::Previous));
        assert_eq!(edges.update(true, false), None);
    }

    #[test]
    fn button0_wins_simultaneous_edges() {
        let mut edges = EdgeDetector::new();
        assert_eq!(edges.update(true, true), Some(Navigation::Previous));
        // Button 1 was already recorded as held; no late Next.
        assert_eq!(edges.update(true, true), None);
        assert_eq!(edges.update(false, true), None);
    }

    #[test]
    fn held_button_does_not_block_the_other() {
        let mut edges = EdgeDetector::new();
        assert_eq!(edges.update(true, false), Some(Navigation::Previous));
        assert_eq!(edges.update(true, true), Some(Navigation::Next));
    }
}
