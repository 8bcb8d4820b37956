//! Tags of the SAF format and the bookkeeping of which blocks are open.

use std::fmt;

/// Block tags recognized in SAF files.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Tag {
    /// `<SAFheader>`
    SafHeader,
    /// `<SAFfooter>`
    SafFooter,
    /// `<SampleGlobalInfo>`
    SampleGlobalInfo,
    /// `<SampleDetailedInfo>`
    SampleDetailedInfo,
    /// `<WeightNames>`
    WeightNames,
    /// `<InitialCounter>`
    InitialCounter,
    /// `<Counter>`
    Counter,
    /// `<Selection>`
    Selection,
    /// `<MergingPlots>`
    MergingPlots,
    /// `<Description>`
    Description,
    /// `<Statistics>`
    Statistics,
    /// `<Data>`
    Data,
    /// `<Histo>`
    Histo,
    /// `<HistoLogX>`
    HistoLogX,
    /// `<HistoFrequency>`
    HistoFrequency,
}

impl Tag {
    /// Every tag, in the order used to index [`BlockStatuses`].
    pub const ALL: [Self; 15] = [
        Self::SafHeader,
        Self::SafFooter,
        Self::SampleGlobalInfo,
        Self::SampleDetailedInfo,
        Self::WeightNames,
        Self::InitialCounter,
        Self::Counter,
        Self::Selection,
        Self::MergingPlots,
        Self::Description,
        Self::Statistics,
        Self::Data,
        Self::Histo,
        Self::HistoLogX,
        Self::HistoFrequency,
    ];

    /// Name of the tag as written in files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SafHeader => "SAFheader",
            Self::SafFooter => "SAFfooter",
            Self::SampleGlobalInfo => "SampleGlobalInfo",
            Self::SampleDetailedInfo => "SampleDetailedInfo",
            Self::WeightNames => "WeightNames",
            Self::InitialCounter => "InitialCounter",
            Self::Counter => "Counter",
            Self::Selection => "Selection",
            Self::MergingPlots => "MergingPlots",
            Self::Description => "Description",
            Self::Statistics => "Statistics",
            Self::Data => "Data",
            Self::Histo => "Histo",
            Self::HistoLogX => "HistoLogX",
            Self::HistoFrequency => "HistoFrequency",
        }
    }

    /// Returns `true` for the three histogram tags.
    #[must_use]
    pub const fn is_histo(self) -> bool {
        matches!(self, Self::Histo | Self::HistoLogX | Self::HistoFrequency)
    }

    const fn index(self) -> usize {
        self as usize
    }

    /// Recognizes a line consisting only of `<TAG>` or `</TAG>`, ignoring case. Returns the tag
    /// and `true` for an opening tag.
    #[must_use]
    pub fn parse_marker(line: &str) -> Option<(Self, bool)> {
        let inner = line.trim().strip_prefix('<')?.strip_suffix('>')?;
        let (inner, open) = inner
            .strip_prefix('/')
            .map_or((inner, true), |closing| (closing, false));
        let inner = inner.trim();

        Self::ALL
            .into_iter()
            .find(|tag| tag.name().eq_ignore_ascii_case(inner))
            .map(|tag| (tag, open))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}

/// Activation state of one block type.
#[derive(Clone, Copy, Debug, Default)]
pub struct SafBlockStatus {
    activated: bool,
    nactivated: usize,
    nlines: usize,
}

impl SafBlockStatus {
    /// Opens the block and resets its line counter.
    pub fn activate(&mut self) {
        self.activated = true;
        self.nactivated += 1;
        self.nlines = 0;
    }

    /// Closes the block.
    pub fn deactivate(&mut self) {
        self.activated = false;
    }

    /// Advances the line counter of the open block.
    pub fn newline(&mut self) {
        self.nlines += 1;
    }

    /// Returns `true` while the block is open.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.activated
    }

    /// Returns how often the block was opened.
    #[must_use]
    pub const fn nactivated(&self) -> usize {
        self.nactivated
    }

    /// Returns the index of the next content line within the open block.
    #[must_use]
    pub const fn nlines(&self) -> usize {
        self.nlines
    }
}

/// Status of every block type.
#[derive(Clone, Debug, Default)]
pub struct BlockStatuses([SafBlockStatus; Tag::ALL.len()]);

impl BlockStatuses {
    /// Returns the status of `tag`.
    #[must_use]
    pub const fn get(&self, tag: Tag) -> &SafBlockStatus {
        &self.0[tag.index()]
    }

    /// Returns the mutable status of `tag`.
    pub const fn get_mut(&mut self, tag: Tag) -> &mut SafBlockStatus {
        &mut self.0[tag.index()]
    }

    /// Returns `true` if `tag` is currently open.
    #[must_use]
    pub const fn is_active(&self, tag: Tag) -> bool {
        self.get(tag).is_active()
    }
}
