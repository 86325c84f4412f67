//! # Scan Console
//!
//! The interactive `stockroom scan` loop.
//!
//! ## Input Routing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         stdin (one line at a time)                      │
//! │                                  │                                      │
//! │               ┌──────────────────┴───────────────────┐                  │
//! │               ▼                                      ▼                  │
//! │      starts with ':'                          anything else             │
//! │   :start :stop :pause :resume           WedgeInput::push_line()         │
//! │   :history :help :quit                           │                      │
//! │               │                                  ▼                      │
//! │               ▼                       ScanSession::next_detection()     │
//! │        ScanSession lifecycle          (cooldown, pause, single shot)    │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                       resolve() ─► Found: show product  │
//! │                                                 └► Not Found: ask for   │
//! │                                                    name/sku/qty/category│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A handheld scanner in keyboard mode types into the same terminal, so
//! scanned codes and typed codes take the same path.
//!
//! The creation form stays open until the product is stored, the operator
//! leaves the name blank, or input ends. Only the field that failed
//! validation is asked again.

use std::io::Write;
use std::sync::Arc;

use chrono::Local;
use stockroom_core::{ProductDraft, ScanHistoryEntry, LOW_STOCK_THRESHOLD};
use stockroom_scan::{
    AudioCue, Catalog, LookupResolution, ScanError, ScanEvent, ScanResult, ScanSession,
    SessionConfig, SilentCue, TerminalBell, WedgeEngine, WedgeInput,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, info};

use crate::commands::products::product_row;
use crate::config::StationConfig;
use crate::error::StationResult;

const HELP: &str = "\
Commands:
  :start    start scanning
  :stop     stop scanning
  :pause    ignore scans without releasing the scanner
  :resume   accept scans again
  :history  list scans of this session, newest first
  :help     show this help
  :quit     leave the console
Any other line is treated as a scanned code.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Builds a scan session on the keyboard-wedge engine.
pub fn wedge_session(
    config: &StationConfig,
    catalog: Arc<dyn Catalog>,
) -> (ScanSession, WedgeInput) {
    let (engine, input) = WedgeEngine::new();
    let audio: Arc<dyn AudioCue> = if config.scanner.sound {
        Arc::new(TerminalBell)
    } else {
        Arc::new(SilentCue)
    };

    let session = ScanSession::new(
        Arc::new(engine),
        catalog,
        SessionConfig::default()
            .decoder(config.decoder())
            .cooldown(config.cooldown()),
    )
    .with_audio(audio);

    (session, input)
}

/// Line-driven front end for a [`ScanSession`].
pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
    session: ScanSession,
    input: WedgeInput,
    low_stock_threshold: i64,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(reader: R, out: W, session: ScanSession, input: WedgeInput) -> Self {
        Console {
            lines: reader.lines(),
            out,
            session,
            input,
            low_stock_threshold: LOW_STOCK_THRESHOLD,
        }
    }

    /// Quantity below which found and created products are flagged `(low)`.
    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    /// Runs until `:quit` or end of input. The scanner is released on exit.
    pub async fn run(&mut self) -> StationResult<()> {
        writeln!(self.out, "Stockroom scan console. Type :start to scan, :help for commands.")?;

        loop {
            self.prompt()?;

            tokio::select! {
                biased;

                detection = self.session.next_detection(), if self.session.is_scanning() => {
                    self.on_detection(detection).await?;
                }
                line = self.lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Console input closed");
                        break;
                    };
                    if self.on_line(&line)? == Flow::Quit {
                        break;
                    }
                }
            }
        }

        self.session.end_session();
        info!(scans = self.session.history().len(), "Scan console closed");
        Ok(())
    }

    fn prompt(&mut self) -> StationResult<()> {
        write!(self.out, "[{}]> ", self.session.state())?;
        self.out.flush()?;
        Ok(())
    }

    fn on_line(&mut self, line: &str) -> StationResult<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let Some(command) = line.strip_prefix(':') else {
            if !self.input.push_line(line) {
                writeln!(self.out, "Not scanning. Type :start first.")?;
            }
            return Ok(Flow::Continue);
        };

        match command {
            "start" => match self.session.begin_session() {
                Ok(()) => writeln!(self.out, "Scanning...")?,
                Err(err) => writeln!(self.out, "Cannot start: {}", err)?,
            },
            "stop" => {
                self.session.end_session();
                writeln!(self.out, "Stopped.")?;
            }
            "pause" => {
                let result = self.session.pause();
                self.report(result, "Paused.")?;
            }
            "resume" => {
                let result = self.session.resume();
                self.report(result, "Resumed.")?;
            }
            "history" => self.print_history()?,
            "help" => writeln!(self.out, "{}", HELP)?,
            "quit" | "q" => return Ok(Flow::Quit),
            other => writeln!(self.out, "Unknown command :{}. Type :help.", other)?,
        }
        Ok(Flow::Continue)
    }

    fn report(&mut self, result: ScanResult<()>, done: &str) -> StationResult<()> {
        match result {
            Ok(()) => writeln!(self.out, "{}", done)?,
            Err(err) => writeln!(self.out, "{}", err)?,
        }
        Ok(())
    }

    fn print_history(&mut self) -> StationResult<()> {
        if self.session.history().is_empty() {
            writeln!(self.out, "No scans yet.")?;
            return Ok(());
        }
        for entry in self.session.history().newest_first() {
            writeln!(self.out, "{}", history_row(entry))?;
        }
        Ok(())
    }

    async fn on_detection(&mut self, detection: ScanResult<ScanEvent>) -> StationResult<()> {
        let event = match detection {
            Ok(event) => event,
            Err(err) => {
                writeln!(self.out, "\nScanner error: {}", err)?;
                return Ok(());
            }
        };

        writeln!(self.out, "\nScanned {} ({})", event.code, event.symbology.label())?;

        match self.session.resolve(&event).await {
            Ok(LookupResolution::Found(product)) => {
                let row = product_row(&product, self.low_stock_threshold);
                writeln!(self.out, "Found: {}", row)?;
            }
            Ok(LookupResolution::NotFound(draft)) => {
                writeln!(self.out, "Not found. New product (leave the name blank to cancel).")?;
                self.fill_draft(draft).await?;
            }
            Err(err) => writeln!(self.out, "{}. Type :start to scan again.", err)?,
        }
        Ok(())
    }

    /// Asks for every draft field, then keeps asking for the failing one.
    async fn fill_draft(&mut self, mut draft: ProductDraft) -> StationResult<()> {
        for field in ["name", "sku", "quantity", "category"] {
            if !self.ask_field(&mut draft, field).await? {
                writeln!(self.out, "Cancelled.")?;
                return Ok(());
            }
        }

        loop {
            match self.session.submit_draft(&draft).await {
                Ok(product) => {
                    writeln!(
                        self.out,
                        "Created: {}",
                        product_row(&product, self.low_stock_threshold)
                    )?;
                    return Ok(());
                }
                Err(ScanError::Validation(err)) => {
                    writeln!(self.out, "  {}", err)?;
                    if !self.ask_field(&mut draft, err.field()).await? {
                        writeln!(self.out, "Cancelled.")?;
                        return Ok(());
                    }
                }
                Err(err) => {
                    writeln!(self.out, "Could not create product: {}", err)?;
                    return Ok(());
                }
            }
        }
    }

    /// Reads one form field. Returns `false` if the form was abandoned.
    async fn ask_field(&mut self, draft: &mut ProductDraft, field: &str) -> StationResult<bool> {
        let (label, slot) = match field {
            "name" => ("Name", &mut draft.name),
            "sku" => ("SKU", &mut draft.sku),
            "quantity" => ("Quantity", &mut draft.quantity),
            "category" => ("Category", &mut draft.category),
            other => {
                debug!(field = other, "No form field to re-ask");
                return Ok(false);
            }
        };

        if slot.is_empty() {
            write!(self.out, "  {}: ", label)?;
        } else {
            write!(self.out, "  {} [{}]: ", label, slot)?;
        }
        self.out.flush()?;

        let Some(answer) = self.lines.next_line().await? else {
            return Ok(false);
        };
        let answer = answer.trim();

        if answer.is_empty() {
            // Blank keeps the current value; a blank name abandons the form
            return Ok(field != "name");
        }
        *slot = answer.to_string();
        Ok(true)
    }
}

fn history_row(entry: &ScanHistoryEntry) -> String {
    format!(
        "{}  {:<16} {:<10} {}",
        entry.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        entry.code,
        entry.symbology.label(),
        entry.outcome
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::{NewProduct, SessionState};
    use stockroom_db::{Database, DbConfig, ProductRepository};

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    fn quiet_config() -> StationConfig {
        let mut config = StationConfig::default();
        config.scanner.sound = false;
        config
    }

    async fn run_console(repo: &ProductRepository, script: &str) -> (String, ScanSession) {
        run_console_with(repo, &quiet_config(), script).await
    }

    async fn run_console_with(
        repo: &ProductRepository,
        config: &StationConfig,
        script: &str,
    ) -> (String, ScanSession) {
        let (session, input) = wedge_session(config, Arc::new(repo.clone()));
        let mut out = Vec::new();
        let session = {
            let mut console = Console::new(script.as_bytes(), &mut out, session, input)
                .low_stock_threshold(config.inventory.low_stock_threshold);
            console.run().await.unwrap();
            console.session
        };
        (String::from_utf8(out).unwrap(), session)
    }

    async fn stock(repo: &ProductRepository, sku: &str, name: &str, quantity: i64) {
        repo.insert(&NewProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            quantity,
            category: Some("Drinks".to_string()),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_scan_known_product() {
        let repo = repo().await;
        stock(&repo, "0123456789012", "Cola 330ml", 24).await;

        let (out, session) =
            run_console(&repo, ":start\n0123456789012\n:history\n:quit\n").await;

        assert!(out.contains("Scanned 0123456789012 (EAN-13)"));
        assert!(out.contains("Found: 0123456789012"));
        assert!(out.contains("Cola 330ml"));
        assert!(out.contains("Found\n"));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.camera_leased());
    }

    #[tokio::test]
    async fn test_unknown_code_opens_form() {
        let repo = repo().await;

        let (out, session) = run_console(
            &repo,
            ":start\n4006381333931\nHighlighter\n\n12\nOffice\n:quit\n",
        )
        .await;

        assert!(out.contains("Not found."));
        assert!(out.contains("SKU [4006381333931]"));
        assert!(out.contains("Created: 4006381333931"));

        let product = repo.require_by_sku("4006381333931").await.unwrap();
        assert_eq!(product.name, "Highlighter");
        assert_eq!(product.quantity, 12);
        assert_eq!(product.category.as_deref(), Some("Office"));
        assert_eq!(
            session.history().last().unwrap().outcome,
            stockroom_core::ScanOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_form_reasks_only_the_failing_field() {
        let repo = repo().await;

        let (out, _) = run_console(
            &repo,
            ":start\nNEW-1\nBolt\n\nlots\nHardware\n40\n:quit\n",
        )
        .await;

        assert!(out.contains("quantity has invalid format"));
        assert_eq!(out.matches("Quantity").count(), 2);
        assert_eq!(out.matches("Category").count(), 1);
        assert_eq!(repo.require_by_sku("NEW-1").await.unwrap().quantity, 40);
    }

    #[tokio::test]
    async fn test_blank_name_cancels_form() {
        let repo = repo().await;

        let (out, session) = run_console(&repo, ":start\nNEW-2\n\n:quit\n").await;

        assert!(out.contains("Cancelled."));
        assert_eq!(repo.count().await.unwrap(), 0);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_sku_reasks_sku() {
        let repo = repo().await;
        stock(&repo, "TAKEN", "Existing", 1).await;

        let (out, _) = run_console(
            &repo,
            ":start\nNEW-3\nWasher\n TAKEN \n5\nHardware\nNEW-3\n:quit\n",
        )
        .await;

        assert!(out.contains("sku 'TAKEN' already exists"));
        assert_eq!(repo.require_by_sku("NEW-3").await.unwrap().name, "Washer");
    }

    #[tokio::test]
    async fn test_lowercase_scan_does_not_match_uppercase_sku() {
        let repo = repo().await;
        stock(&repo, "ABC", "Upper", 1).await;

        let (out, _) = run_console(&repo, ":start\nabc\n\n:quit\n").await;

        assert!(!out.contains("Found:"));
        assert!(out.contains("Not found."));
        assert!(out.contains("Cancelled."));
    }

    #[tokio::test]
    async fn test_code39_space_creates_product() {
        let repo = repo().await;

        let (out, _) =
            run_console(&repo, ":start\nAB 12\nSpacer\n\n4\nHardware\n:quit\n").await;

        assert!(out.contains("Scanned AB 12 (Code 39)"));
        assert!(out.contains("Created: AB 12"));
        assert_eq!(repo.require_by_sku("AB 12").await.unwrap().name, "Spacer");
    }

    #[tokio::test]
    async fn test_low_flag_follows_configured_threshold() {
        let repo = repo().await;
        stock(&repo, "0123456789012", "Cola 330ml", 3).await;
        let script = ":start\n0123456789012\n:quit\n";

        let mut config = quiet_config();
        config.inventory.low_stock_threshold = 2;
        let (out, _) = run_console_with(&repo, &config, script).await;
        assert!(out.contains("Found: 0123456789012"));
        assert!(!out.contains("(low)"));

        config.inventory.low_stock_threshold = 10;
        let (out, _) = run_console_with(&repo, &config, script).await;
        assert!(out.contains("(low)"));
    }

    #[tokio::test]
    async fn test_codes_ignored_while_not_scanning() {
        let repo = repo().await;

        let (out, session) = run_console(&repo, "0123456789012\n:history\n:quit\n").await;

        assert!(out.contains("Not scanning."));
        assert!(out.contains("No scans yet."));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_repeat_scan_inside_cooldown_is_dropped() {
        let repo = repo().await;
        stock(&repo, "0123456789012", "Cola 330ml", 24).await;

        let (out, session) = run_console(
            &repo,
            ":start\n0123456789012\n:start\n0123456789012\n:stop\n:quit\n",
        )
        .await;

        assert_eq!(out.matches("Scanned").count(), 1);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_paused_scans_are_discarded() {
        let repo = repo().await;
        stock(&repo, "0123456789012", "Cola 330ml", 24).await;

        let (out, session) = run_console(
            &repo,
            ":start\n:pause\n0123456789012\n:resume\n:history\n:quit\n",
        )
        .await;

        assert!(out.contains("Paused."));
        assert!(out.contains("Resumed."));
        assert!(!out.contains("Scanned"));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_commands_report_misuse() {
        let repo = repo().await;

        let (out, session) =
            run_console(&repo, ":pause\n:start\n:start\n:bogus\n:help\n").await;

        assert!(out.contains("Cannot start"));
        assert!(out.contains("Unknown command :bogus"));
        assert!(out.contains(":history"));
        // End of input behaves like :quit
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.camera_leased());
    }
}
