/// Where the player stands in its list, useful for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerProgress {
    pub cursor: usize,
    pub total: usize,
    /// Normalized to `[0, 1]`.
    pub fraction: f64,
}

impl PlayerProgress {
    #[must_use]
    pub fn new(cursor: usize, total: usize, is_playing: bool) -> Self {
        let fraction = if total == 0 || (cursor == 0 && !is_playing) {
            0.0
        } else if cursor >= total {
            1.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let fraction = cursor as f64 / total as f64;
            fraction
        };
        Self {
            cursor,
            total,
            fraction,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.cursor >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_zero_before_start_and_one_when_finished() {
        assert_eq!(PlayerProgress::new(0, 4, false).fraction, 0.0);
        assert_eq!(PlayerProgress::new(0, 4, true).fraction, 0.0);
        assert_eq!(PlayerProgress::new(2, 4, true).fraction, 0.5);
        assert_eq!(PlayerProgress::new(1, 4, false).fraction, 0.25);
        assert_eq!(PlayerProgress::new(4, 4, false).fraction, 1.0);
        assert!(PlayerProgress::new(4, 4, false).is_complete());
    }

    #[test]
    fn empty_list_never_reports_progress() {
        let progress = PlayerProgress::new(0, 0, false);
        assert_eq!(progress.fraction, 0.0);
        assert!(!progress.is_complete());
    }
}
