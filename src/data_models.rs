use serde::{Deserialize, Serialize};

/// A single provider record. Passed through to the caller untouched.
pub type ResultRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SearchResponse {
    pub results: Vec<ResultRecord>,
}

impl SearchResponse {
    pub fn new(results: Vec<ResultRecord>) -> SearchResponse {
        SearchResponse { results }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    Text,
    Answers,
    Images,
    Videos,
}

impl SearchMode {
    pub const ALL: [SearchMode; 4] = [
        SearchMode::Text,
        SearchMode::Answers,
        SearchMode::Images,
        SearchMode::Videos,
    ];

    /// Route the mode is served on.
    pub fn path(self) -> &'static str {
        match self {
            SearchMode::Text => "/search",
            SearchMode::Answers => "/searchAnswers",
            SearchMode::Images => "/searchImages",
            SearchMode::Videos => "/searchVideos",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SearchMode::Text => "text",
            SearchMode::Answers => "answers",
            SearchMode::Images => "images",
            SearchMode::Videos => "videos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeSearch {
    On,
    Moderate,
    Off,
}

impl SafeSearch {
    /// Value of the `p` parameter on the image and video endpoints.
    pub fn as_param(self) -> &'static str {
        match self {
            SafeSearch::On | SafeSearch::Moderate => "1",
            SafeSearch::Off => "-1",
        }
    }

    /// Value of the `kp` field on the lite text endpoint.
    pub fn as_kp(self) -> &'static str {
        match self {
            SafeSearch::On => "1",
            SafeSearch::Moderate => "-1",
            SafeSearch::Off => "-2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLimit {
    Day,
    Week,
    Month,
    Year,
}

impl TimeLimit {
    pub fn as_param(self) -> &'static str {
        match self {
            TimeLimit::Day => "d",
            TimeLimit::Week => "w",
            TimeLimit::Month => "m",
            TimeLimit::Year => "y",
        }
    }

    /// Spelling used by the image endpoint's `time:` filter.
    pub fn as_word(self) -> &'static str {
        match self {
            TimeLimit::Day => "Day",
            TimeLimit::Week => "Week",
            TimeLimit::Month => "Month",
            TimeLimit::Year => "Year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBackend {
    Lite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    High,
    Standard,
}

impl Resolution {
    pub fn as_param(self) -> &'static str {
        match self {
            Resolution::High => "high",
            Resolution::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOptions {
    pub safesearch: SafeSearch,
    pub timelimit: Option<TimeLimit>,
    pub backend: TextBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub safesearch: SafeSearch,
    pub timelimit: Option<TimeLimit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoOptions {
    pub safesearch: SafeSearch,
    pub timelimit: Option<TimeLimit>,
    pub resolution: Option<Resolution>,
}

// Fixed option sets. Callers pick a mode, never the options.

pub const TEXT_OPTIONS: TextOptions = TextOptions {
    safesearch: SafeSearch::Off,
    timelimit: Some(TimeLimit::Year),
    backend: TextBackend::Lite,
};

pub const IMAGE_OPTIONS: ImageOptions = ImageOptions {
    safesearch: SafeSearch::Off,
    timelimit: None,
};

pub const VIDEO_OPTIONS: VideoOptions = VideoOptions {
    safesearch: SafeSearch::Off,
    timelimit: None,
    resolution: Some(Resolution::High),
};
