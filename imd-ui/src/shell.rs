//! Interactive shell
//!
//! Line-oriented stand-in for the three-panel UI: library filter on the
//! left, search box with suggestions in the middle, recommendations on the
//! right. Queries run in the background so a new one can supersede a slow
//! one; results are re-rendered whenever the request state changes.

use std::sync::Arc;

use anyhow::Result;
use imd_common::config::ClientConfig;
use imd_common::{RequestStatus, SongInfo};
use imd_ui::api::EndpointFamily;
use imd_ui::library::LibraryFilter;
use imd_ui::view::{self, LibraryListing};
use imd_ui::Session;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::debug;

const HELP: &str = "\
Commands:
  type <text>      edit the search box (suggestions follow)
  filter [text]    filter the library panel
  search [text]    recommendations by name (default: search box text)
  select <n>       search for entry n of the last listing
  upload <path>    recommendations by audio file
  play             web search for the now-playing song
  clear            reset recommendations
  refresh          reload the song library
  status           show the recommendations panel
  help             this text
  quit             leave";

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

/// Library as last loaded
enum LibraryState {
    Loading,
    Failed,
    Loaded(Arc<Vec<SongInfo>>),
}

struct Shell {
    session: Session,
    library: LibraryState,
    library_filter: LibraryFilter,
    search_box: LibraryFilter,
    /// Entries addressable by `select <n>`
    last_listing: Vec<SongInfo>,
    upload_started: Option<Instant>,
}

pub async fn run(session: Session, config: &ClientConfig) -> Result<()> {
    let mut shell = Shell {
        library: LibraryState::Loading,
        library_filter: LibraryFilter::new(
            config.library_filter_debounce,
            config.library_filter_limit,
        ),
        search_box: LibraryFilter::new(config.suggestion_debounce, config.suggestion_limit),
        last_listing: Vec::new(),
        upload_started: None,
        session,
    };

    println!("Intelligent Music Discovery (type 'help' for commands)");
    shell.print_library();
    shell.load_library(false).await;
    shell.print_library();

    let mut state_rx = shell.session.subscribe_state();
    let mut now_playing_rx = shell.session.subscribe_now_playing();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if shell.handle(line.trim()).await == Flow::Quit {
                    break;
                }
            }
            Some(_) = shell.library_filter.settled() => {
                shell.print_library();
            }
            Some(_) = shell.search_box.settled() => {
                shell.print_suggestions();
            }
            Ok(()) = state_rx.changed() => {
                let status = state_rx.borrow_and_update().status;
                shell.on_state_change(status);
            }
            Ok(()) = now_playing_rx.changed() => {
                let song = now_playing_rx.borrow_and_update().clone();
                if let Some(bar) = view::now_playing_bar(song.as_ref()) {
                    println!("{}", bar);
                }
            }
            else => break,
        }
    }

    debug!("Shell finished");
    Ok(())
}

impl Shell {
    async fn handle(&mut self, line: &str) -> Flow {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "type" => self.search_box.set_query(rest),
            "filter" => self.library_filter.set_query(rest),
            "search" => {
                let text = if rest.is_empty() {
                    self.search_box.raw_query().to_string()
                } else {
                    rest.to_string()
                };
                self.spawn_search(text);
            }
            "select" => self.select(rest),
            "upload" => self.upload(rest).await,
            "play" => {
                if let Err(e) = crate::play(&self.session) {
                    println!("{}", e);
                }
            }
            "clear" => {
                self.session.clear();
                self.search_box.reset("");
                self.upload_started = None;
            }
            "refresh" => {
                self.load_library(true).await;
                self.print_library();
            }
            "status" => self.print_status(),
            "help" | "?" => println!("{}", HELP),
            "quit" | "exit" => return Flow::Quit,
            other => println!("Unknown command '{}' (try 'help')", other),
        }
        Flow::Continue
    }

    async fn load_library(&mut self, refresh: bool) {
        let result = if refresh {
            self.session.refresh_library().await
        } else {
            self.session.library().await
        };

        self.library = match result {
            Ok(songs) => LibraryState::Loaded(songs),
            Err(e) => {
                println!("{}", e.user_message(EndpointFamily::Library));
                LibraryState::Failed
            }
        };
    }

    fn spawn_search(&mut self, text: String) {
        self.search_box.reset(text.clone());
        let session = self.session.clone();
        tokio::spawn(async move {
            session.search(&text).await;
        });
    }

    fn select(&mut self, arg: &str) {
        let Some(song) = arg
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.last_listing.get(i))
            .cloned()
        else {
            println!("No entry '{}' in the last listing", arg);
            return;
        };

        self.search_box.reset(song.track_name.clone());
        let session = self.session.clone();
        tokio::spawn(async move {
            session.select_library_song(&song).await;
        });
    }

    async fn upload(&mut self, path: &str) {
        if path.is_empty() {
            println!("Usage: upload <path>");
            return;
        }

        let upload = match crate::read_upload(std::path::Path::new(path)).await {
            Ok(upload) => upload,
            Err(e) => {
                println!("{:#}", e);
                return;
            }
        };

        self.search_box.reset("");
        self.upload_started = Some(Instant::now());
        let session = self.session.clone();
        tokio::spawn(async move {
            session.upload(vec![upload]).await;
        });
    }

    fn on_state_change(&mut self, status: RequestStatus) {
        if status != RequestStatus::Loading || !self.session.state().is_analyzing_audio() {
            self.upload_started = None;
        }
        self.print_status();
    }

    fn print_status(&self) {
        let state = self.session.state();
        if let Some(started) = self.upload_started.filter(|_| state.is_analyzing_audio()) {
            println!(
                "{}",
                view::analyzing_panel(view::estimated_progress(started.elapsed()))
            );
        }
        crate::print_results(&self.session);
    }

    fn print_library(&mut self) {
        let text = match &self.library {
            LibraryState::Loading => {
                view::library_panel(&LibraryListing::Loading, self.library_filter.raw_query())
            }
            LibraryState::Failed => {
                view::library_panel(&LibraryListing::Failed, self.library_filter.raw_query())
            }
            LibraryState::Loaded(songs) => {
                let entries = self.library_filter.view(songs);
                self.last_listing = entries.iter().map(|s| (*s).clone()).collect();
                view::library_panel(
                    &LibraryListing::Ready(entries),
                    self.library_filter.raw_query(),
                )
            }
        };
        println!("{}", text);
    }

    fn print_suggestions(&mut self) {
        let LibraryState::Loaded(songs) = &self.library else {
            return;
        };

        let entries = self
            .search_box
            .suggestions(songs, self.session.suggestion_policy());
        if entries.is_empty() {
            return;
        }
        self.last_listing = entries.iter().map(|s| (*s).clone()).collect();
        println!("Suggestions:");
        println!("{}", view::suggestions(&entries));
    }
}
