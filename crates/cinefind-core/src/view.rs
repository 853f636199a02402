//! Display records shaped from API data.
//!
//! Pure functions only; the CLI and the terminal screen render these.

use cinefind_api::FetchError;
use cinefind_api::store::SearchCountDocument;
use cinefind_api::tmdb::{Movie, MovieDetails, poster_url};

use crate::fetch::FetchState;

/// Image shown when a movie has no poster.
pub const PLACEHOLDER_POSTER_URL: &str =
    "https://placehold.co/200x400/1a1a1a/FFFFFF.png?text=No%20Image";

/// Shown for missing values.
const NOT_AVAILABLE: &str = "N/A";

/// Separator for joined name lists.
const LIST_SEPARATOR: &str = " • ";

/// Vote average above which a movie is marked hot.
const HOT_THRESHOLD: f64 = 7.0;

/// Number of cast members shown on the detail view.
const TOP_CAST: usize = 5;

/// One movie in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieCard {
    /// TMDB movie ID.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Release year or `N/A`.
    pub year: String,
    /// Upper-cased original language, `EN` when unknown.
    pub language: String,
    /// Vote average on a 0-5 star scale.
    pub stars: u8,
    /// Poster URL, or the placeholder image.
    pub poster_url: String,
    /// Vote average as a 0-100 bar width.
    pub popularity_percent: u8,
    /// Vote average above 7.
    pub hot: bool,
}

impl MovieCard {
    /// Builds a card from a listing entry.
    #[must_use]
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: release_year(movie.release_date.as_deref()),
            language: movie
                .original_language
                .as_deref()
                .filter(|l| !l.is_empty())
                .map_or_else(|| String::from("EN"), str::to_uppercase),
            stars: round_to_u8(movie.vote_average / 2.0, 5),
            poster_url: poster_url(movie.poster_path.as_deref())
                .unwrap_or_else(|| String::from(PLACEHOLDER_POSTER_URL)),
            popularity_percent: round_to_u8(movie.vote_average * 10.0, 100),
            hot: movie.vote_average > HOT_THRESHOLD,
        }
    }
}

/// One entry of the trending list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingCard {
    /// 1-based rank.
    pub rank: usize,
    /// Search term as recorded.
    pub search_term: String,
    /// Times searched.
    pub count: u32,
    /// TMDB ID of the movie first found for the term.
    pub movie_id: u64,
    /// Title of that movie.
    pub title: String,
    /// Poster URL, or the placeholder image.
    pub poster_url: String,
}

/// Ranks trending documents in the order given.
#[must_use]
pub fn trending_cards(documents: &[SearchCountDocument]) -> Vec<TrendingCard> {
    documents
        .iter()
        .zip(1..)
        .map(|(doc, rank)| TrendingCard {
            rank,
            search_term: doc.search_term.clone(),
            count: doc.count,
            movie_id: doc.movie_id,
            title: doc.title.clone(),
            poster_url: doc
                .poster_url
                .clone()
                .unwrap_or_else(|| String::from(PLACEHOLDER_POSTER_URL)),
        })
        .collect()
}

/// Movie detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    /// Title.
    pub title: String,
    /// Tagline, if any.
    pub tagline: Option<String>,
    /// Release year or `N/A`.
    pub year: String,
    /// Runtime like `155m`, or `N/A`.
    pub runtime: String,
    /// Rating like `8/10`.
    pub rating: String,
    /// Number of votes.
    pub vote_count: u32,
    /// Genre names.
    pub genres: Vec<String>,
    /// Overview or `N/A`.
    pub overview: String,
    /// Budget like `$165.0M`, or `N/A`.
    pub budget: String,
    /// Revenue like `$402.0M`, or `N/A`.
    pub revenue: String,
    /// Production company names joined with ` • `, or `N/A`.
    pub production: String,
    /// Spoken language names joined with ` • `, or `N/A`.
    pub languages: String,
    /// Poster URL, or the placeholder image.
    pub poster_url: String,
    /// Director, when credits were included.
    pub director: Option<String>,
    /// Leading cast as `Name as Character`.
    pub cast: Vec<String>,
    /// First YouTube trailer, when videos were included.
    pub trailer_url: Option<String>,
}

impl DetailView {
    /// Builds the detail view.
    #[must_use]
    pub fn from_details(details: &MovieDetails) -> Self {
        let credits = details.credits.as_ref();
        Self {
            title: details.title.clone(),
            tagline: details.tagline.clone().filter(|t| !t.is_empty()),
            year: release_year(details.release_date.as_deref()),
            runtime: details
                .runtime
                .filter(|r| *r > 0)
                .map_or_else(|| String::from(NOT_AVAILABLE), |r| format!("{r}m")),
            rating: format!("{}/10", round_to_u8(details.vote_average, 10)),
            vote_count: details.vote_count,
            genres: details.genres.iter().map(|g| g.name.clone()).collect(),
            overview: details
                .overview
                .clone()
                .filter(|o| !o.is_empty())
                .unwrap_or_else(|| String::from(NOT_AVAILABLE)),
            budget: millions(details.budget),
            revenue: millions(details.revenue),
            production: join_or_na(details.production_companies.iter().map(|c| c.name.as_str())),
            languages: join_or_na(details.spoken_languages.iter().map(|l| l.english_name.as_str())),
            poster_url: poster_url(details.poster_path.as_deref())
                .unwrap_or_else(|| String::from(PLACEHOLDER_POSTER_URL)),
            director: credits.and_then(|c| {
                c.crew
                    .iter()
                    .find(|m| m.job.as_deref() == Some("Director"))
                    .map(|m| m.name.clone())
            }),
            cast: credits
                .map(|c| {
                    c.cast
                        .iter()
                        .take(TOP_CAST)
                        .map(|m| match m.character.as_deref() {
                            Some(character) if !character.is_empty() => {
                                format!("{} as {character}", m.name)
                            }
                            _ => m.name.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            trailer_url: details.videos.as_ref().and_then(|v| {
                v.results
                    .iter()
                    .find(|video| video.site == "YouTube" && video.kind == "Trailer")
                    .map(|video| format!("https://www.youtube.com/watch?v={}", video.key))
            }),
        }
    }
}

/// Placeholder shown when a list has nothing to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    /// A query was entered but nothing matched.
    NoResults {
        /// The query as typed.
        query: String,
    },
    /// No query yet.
    Prompt,
}

impl EmptyState {
    /// Chooses the placeholder for `query`.
    #[must_use]
    pub fn for_query(query: &str) -> Self {
        if query.trim().is_empty() {
            Self::Prompt
        } else {
            Self::NoResults {
                query: String::from(query),
            }
        }
    }

    /// Heading line.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::NoResults { .. } => "No Results Found",
            Self::Prompt => "Discover Movies",
        }
    }

    /// Body text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoResults { query } => {
                format!("We couldn't find any movies matching \"{query}\"")
            }
            Self::Prompt => {
                String::from("Search for your favorite movies using the search bar above")
            }
        }
    }

    /// Follow-up hint.
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::NoResults { .. } => "Clear the search to start over",
            Self::Prompt => "Try \"Inception\" or \"Avatar\"",
        }
    }
}

/// User-visible text for a failed fetch.
#[must_use]
pub fn error_text(err: &FetchError) -> String {
    format!("Error : {err}")
}

/// What the search screen should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchBody {
    /// Request in flight.
    Loading,
    /// Request failed; carries [`error_text`].
    Error(String),
    /// At least one movie.
    Results {
        /// `Search results for {query}`, or `None` without a query.
        heading: Option<String>,
        /// Movie cards in API order.
        cards: Vec<MovieCard>,
    },
    /// Nothing to show.
    Empty(EmptyState),
}

impl SearchBody {
    /// Chooses the body for the current query and results state.
    #[must_use]
    pub fn from_state(query: &str, state: &FetchState<Vec<Movie>>) -> Self {
        if state.loading {
            return Self::Loading;
        }
        if let Some(err) = &state.error {
            return Self::Error(error_text(err));
        }
        match state.data.as_deref() {
            Some(movies) if !movies.is_empty() => Self::Results {
                heading: (!query.trim().is_empty())
                    .then(|| format!("Search results for {query}")),
                cards: movies.iter().map(MovieCard::from_movie).collect(),
            },
            _ => Self::Empty(EmptyState::for_query(query)),
        }
    }
}

/// Combined status of the home feed's two fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Either fetch is in flight.
    Loading,
    /// A fetch failed; the popular listing's error wins.
    Error(String),
    /// Both fetches settled without error.
    Ready,
}

/// Home feed: trending searches plus the popular listing.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeFeed {
    /// Trending searches.
    pub trending: FetchState<Vec<SearchCountDocument>>,
    /// Popular movies.
    pub popular: FetchState<Vec<Movie>>,
}

impl HomeFeed {
    /// Loading wins over errors; the popular listing's error wins over trending's.
    #[must_use]
    pub fn status(&self) -> FeedStatus {
        if self.popular.loading || self.trending.loading {
            return FeedStatus::Loading;
        }
        self.popular
            .error
            .as_ref()
            .or(self.trending.error.as_ref())
            .map_or(FeedStatus::Ready, |err| FeedStatus::Error(error_text(err)))
    }

    /// Ranked trending entries.
    #[must_use]
    pub fn trending_cards(&self) -> Vec<TrendingCard> {
        self.trending
            .data
            .as_deref()
            .map(trending_cards)
            .unwrap_or_default()
    }

    /// Popular movie cards.
    #[must_use]
    pub fn popular_cards(&self) -> Vec<MovieCard> {
        self.popular
            .data
            .as_deref()
            .map(|movies| movies.iter().map(MovieCard::from_movie).collect())
            .unwrap_or_default()
    }
}

/// Year part of a `YYYY-MM-DD` date, or `N/A`.
fn release_year(date: Option<&str>) -> String {
    date.and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .map_or_else(|| String::from(NOT_AVAILABLE), String::from)
}

/// `$X.YM` with one decimal, or `N/A` for zero.
fn millions(amount: u64) -> String {
    if amount == 0 {
        return String::from(NOT_AVAILABLE);
    }
    let tenths = amount.saturating_add(50_000) / 100_000;
    format!("${}.{}M", tenths / 10, tenths % 10)
}

fn join_or_na<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let joined = names
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR);
    if joined.is_empty() {
        String::from(NOT_AVAILABLE)
    } else {
        joined
    }
}

/// Rounds half up and clamps into `0..=max`; non-finite input is 0.
fn round_to_u8(value: f64, max: u8) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    let rounded = value.round().clamp(0.0, f64::from(max));
    (0..=max).find(|n| f64::from(*n) >= rounded).unwrap_or(max)
}
