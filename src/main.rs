use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use showfeed::config::Config;
use showfeed::feed::{adjacent, available_years, Episode, EpisodeQuery, FeedAggregator};
use showfeed::landing::load_landing;
use showfeed::upstream::Fetcher;
use showfeed::util::{display_width, sanitize_for_terminal, truncate_to_width};
use showfeed::video::{LiveStatus, PageRequest, Video, VideoDirectory, VideoQuery};

const DATE_WIDTH: usize = 10;
const TITLE_WIDTH: usize = 60;
const SUMMARY_LEN: usize = 160;

/// Get the default config file path (~/.config/showfeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("showfeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "showfeed",
    version,
    about = "Podcast episodes and channel videos for the show site"
)]
struct Args {
    /// Config file (default: ~/.config/showfeed/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List episodes from every feed, newest first
    Episodes {
        /// Match title or description (case-insensitive)
        #[arg(long)]
        query: Option<String>,
        /// Only episodes published in this year
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show one episode by slug
    Episode {
        slug: String,
        #[arg(long)]
        json: bool,
    },
    /// List one page of channel uploads
    Videos {
        /// Cursor printed by a previous page
        #[arg(long)]
        page_token: Option<String>,
        /// 1-50, default 24
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show one video by id
    Video {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the live broadcast as JSON, or {"message": "not live"}
    Live,
    /// Landing page: live or featured video, recent uploads, latest episodes
    Home {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let settings = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_process_env()
        .into_settings()
        .context("Invalid configuration")?;

    let fetcher = Fetcher::new(&settings.http).context("Failed to build HTTP client")?;
    let aggregator = FeedAggregator::new(settings.feeds, fetcher.clone());
    let directory = VideoDirectory::new(settings.video, fetcher);

    match args.command {
        Command::Episodes {
            query,
            year,
            limit,
            json,
        } => {
            let episodes = aggregator.list_episodes().await;
            let query = EpisodeQuery { text: query, year };
            let mut matched = query.apply(&episodes);
            if let Some(limit) = limit {
                matched.truncate(limit);
            }

            if json {
                print_json(&matched)?;
            } else {
                for ep in &matched {
                    println!("{}", episode_row(ep));
                }
                let years = available_years(&episodes);
                if !years.is_empty() && query.year.is_none() {
                    let years: Vec<String> = years.iter().map(i32::to_string).collect();
                    println!();
                    println!(
                        "{} of {} episodes. Years: {}",
                        matched.len(),
                        episodes.len(),
                        years.join(", ")
                    );
                }
            }
        }
        Command::Episode { slug, json } => {
            let episodes = aggregator.list_episodes().await;
            let Some(ep) = episodes.iter().find(|ep| ep.slug == slug) else {
                eprintln!("Error: No episode with slug '{}'", slug);
                std::process::exit(1);
            };

            if json {
                print_json(ep)?;
            } else {
                print_episode(ep);
                if let Some(neighbours) = adjacent(&episodes, &slug) {
                    if let Some(prev) = neighbours.previous {
                        println!("Newer: {}", prev.slug);
                    }
                    if let Some(next) = neighbours.next {
                        println!("Older: {}", next.slug);
                    }
                }
            }
        }
        Command::Videos {
            page_token,
            page_size,
            query,
            json,
        } => {
            let page = directory
                .list_videos(&PageRequest {
                    page_token,
                    page_size,
                })
                .await;
            let query = VideoQuery { text: query };

            if json {
                if query.text.is_some() {
                    print_json(&query.apply(&page.videos))?;
                } else {
                    print_json(&page)?;
                }
            } else {
                if !directory.capabilities().listing {
                    eprintln!("Video listing needs YOUTUBE_API_KEY and YOUTUBE_CHANNEL_ID");
                }
                for video in query.apply(&page.videos) {
                    println!("{}", video_row(video));
                }
                if let Some(token) = &page.prev_page_token {
                    println!("Previous page: --page-token {}", token);
                }
                if let Some(token) = &page.next_page_token {
                    println!("Next page: --page-token {}", token);
                }
            }
        }
        Command::Video { id, json } => {
            let Some(video) = directory.get_video_by_id(&id).await else {
                eprintln!("Error: Video '{}' not found", id);
                std::process::exit(1);
            };
            if json {
                print_json(&video)?;
            } else {
                print_video(&video);
            }
        }
        Command::Live => {
            let status = LiveStatus::from(directory.get_live_video().await);
            print_json(&status)?;
        }
        Command::Home { json } => {
            let landing = load_landing(&aggregator, &directory).await;
            if json {
                print_json(&landing)?;
            } else {
                match (&landing.live, &landing.featured) {
                    (Some(live), _) => println!("LIVE NOW  {}", sanitize_for_terminal(&live.title)),
                    (None, Some(featured)) => {
                        println!("Featured  {}", sanitize_for_terminal(&featured.title))
                    }
                    (None, None) => {}
                }
                println!();
                for video in &landing.grid {
                    println!("{}", video_row(video));
                }
                println!();
                for ep in &landing.episodes {
                    println!("{}", episode_row(ep));
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Left-aligns `s` in exactly `width` terminal columns.
fn cell(s: &str, width: usize) -> String {
    let clean = sanitize_for_terminal(s);
    let cut = truncate_to_width(&clean, width);
    let fill = width.saturating_sub(display_width(&cut));
    format!("{}{}", cut, " ".repeat(fill))
}

fn short_date(raw: Option<&str>) -> String {
    raw.map(|d| d.chars().take(DATE_WIDTH).collect())
        .unwrap_or_default()
}

fn episode_row(ep: &Episode) -> String {
    let date = ep
        .published()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!(
        "{}  {}  {}",
        cell(&date, DATE_WIDTH),
        cell(&ep.title, TITLE_WIDTH),
        ep.slug
    )
}

fn video_row(video: &Video) -> String {
    format!(
        "{}  {}  {}",
        cell(&short_date(video.published_at.as_deref()), DATE_WIDTH),
        cell(&video.title, TITLE_WIDTH),
        video.id
    )
}

fn print_episode(ep: &Episode) {
    println!("{}", sanitize_for_terminal(&ep.title));
    if !ep.published_at.is_empty() {
        println!("Published: {}", ep.published_at);
    }
    if let Some(audio) = &ep.audio_url {
        println!("Audio:     {}", audio);
    }
    if let Some(link) = &ep.link {
        println!("Link:      {}", link);
    }
    println!("Feed:      {}", ep.source);
    let summary = ep.summary(SUMMARY_LEN);
    if !summary.is_empty() {
        println!();
        println!("{}", sanitize_for_terminal(&summary));
    }
}

fn print_video(video: &Video) {
    println!("{}", sanitize_for_terminal(&video.title));
    if let Some(published) = &video.published_at {
        println!("Published: {}", published);
    }
    println!("Watch:     {}", video.url);
    if let Some(thumb) = &video.thumbnail {
        println!("Thumbnail: {}", thumb);
    }
    if !video.description.is_empty() {
        println!();
        println!("{}", sanitize_for_terminal(&video.description));
    }
}
