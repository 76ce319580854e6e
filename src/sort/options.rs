//! Configuration of a [`SortListModel`](super::SortListModel).

/// Merge outputs performed by one [`step`](super::SortListModel::step).
pub const DEFAULT_STEP_BUDGET: usize = 1024;

/// Options controlling how a [`SortListModel`](super::SortListModel) sorts.
///
/// # Examples
///
/// ```rust
/// use sortlist::sort::SortOptions;
///
/// let options = SortOptions::default()
///     .with_incremental(true)
///     .with_step_budget(256);
/// assert!(options.incremental());
/// assert_eq!(options.step_budget(), 256);
///
/// // A budget of zero would never make progress.
/// assert_eq!(SortOptions::default().with_step_budget(0).step_budget(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortOptions {
    incremental: bool,
    step_budget: usize,
}

impl SortOptions {
    /// Sets [`incremental`](Self::incremental).
    #[must_use]
    pub const fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    /// Sets [`step_budget`](Self::step_budget).
    #[must_use]
    pub const fn with_step_budget(mut self, step_budget: usize) -> Self {
        self.step_budget = step_budget;
        self
    }

    /// Resort in bounded slices instead of to completion.
    #[must_use]
    pub const fn incremental(&self) -> bool {
        self.incremental
    }

    /// Upper bound on the work done by one incremental slice.
    ///
    /// Also the size from which a single source insertion is appended and
    /// sorted incrementally instead of being placed item by item. Never less
    /// than one, whatever was configured or deserialized.
    #[must_use]
    pub const fn step_budget(&self) -> usize {
        if self.step_budget == 0 { 1 } else { self.step_budget }
    }
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            incremental: false,
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }
}
