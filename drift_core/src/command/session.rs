//! The session - one player, one world, one command at a time.

use tracing::{info, warn};

use game_world::{Node, PlayerState, World, START_NODE};

use crate::cipher::{decode, unlock_sigils, CipherKind};
use crate::command::{Command, ParseError};
use crate::effects::{apply_script, ScriptOutcome};
use crate::persist::SaveFile;

/// The node where the run can end.
const ENDING_NODE: &str = "core.relic";

const HELP_TEXT: &str = "Commands:
  help                 show this list
  scan                 list discovered nodes
  connect <node>       jump to a node
  ls                   list files in the node
  cat <file>           read a file
  download <file>      take a script or item
  run <script>         execute a script in your kit
  decode rot13|b64     decode the last cipher you read
  inventory            list your scripts and items
  profile              show your handle and status
  log                  review your activity
  home                 return to hub
  save                 write a save file
  load                 load save file
  quit                 exit";

const EXFILTRATE_PROSE: &str = "You lift the relic into your shell. The Drift goes quiet behind you.
A new story begins, sealed from the old net.";

const RESTORE_PROSE: &str = "You bind the relic back to the Drift. The net exhales.
The archive sleeps, but its signal will haunt the edges.";

/// What one command produced: prose blocks to render, and whether the
/// session should end.
#[derive(Debug, Default)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn say(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }
}

/// A running game: the immutable world, the player, and the save target.
#[derive(Debug)]
pub struct Session<'w> {
    world: &'w World,
    state: PlayerState,
    save: SaveFile,
}

impl<'w> Session<'w> {
    pub fn new(world: &'w World, state: PlayerState, save: SaveFile) -> Self {
        Self { world, state, save }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Current location, for the prompt.
    pub fn location(&self) -> &str {
        &self.state.location
    }

    fn current_node(&self) -> Option<&'w Node> {
        self.world.get(&self.state.location)
    }

    /// Announce the current location, as if just arriving.
    pub fn look(&mut self) -> Reply {
        let mut reply = Reply::default();
        let location = self.state.location.clone();
        self.enter(&location, &mut reply);
        reply
    }

    /// Parse and dispatch one raw input line.
    pub fn handle_line(&mut self, line: &str) -> Reply {
        match Command::parse(line) {
            Ok(Some(command)) => self.dispatch(command),
            Ok(None) => Reply::default(),
            Err(ParseError::Malformed) => {
                let mut reply = Reply::default();
                reply.say(ParseError::Malformed.to_string());
                reply
            }
        }
    }

    /// Dispatch an already-parsed command.
    pub fn dispatch(&mut self, command: Command) -> Reply {
        let mut reply = Reply::default();
        match command {
            Command::Help => reply.say(HELP_TEXT),
            Command::Scan => self.cmd_scan(&mut reply),
            Command::Connect(target) => self.cmd_connect(target, &mut reply),
            Command::Ls => self.cmd_ls(&mut reply),
            Command::Cat(name) => self.cmd_cat(name, &mut reply),
            Command::Download(name) => self.cmd_download(name, &mut reply),
            Command::Run(script) => self.cmd_run(script, &mut reply),
            Command::Decode { cipher, payload } => self.cmd_decode(cipher, payload, &mut reply),
            Command::Inventory => self.cmd_inventory(&mut reply),
            Command::Profile => self.cmd_profile(&mut reply),
            Command::Log => self.cmd_log(&mut reply),
            Command::Home => self.enter(START_NODE, &mut reply),
            Command::Save => self.cmd_save(&mut reply),
            Command::Load => self.cmd_load(&mut reply),
            Command::Exfiltrate => self.cmd_ending("exfiltrate", EXFILTRATE_PROSE, &mut reply),
            Command::Restore => self.cmd_ending("restore", RESTORE_PROSE, &mut reply),
            Command::Quit => reply.quit = true,
            Command::Unknown(_) => reply.say("Unknown command. Type help for options."),
        }
        reply
    }

    /// Move to a node and announce it. Gate checks belong to the callers.
    fn enter(&mut self, node_id: &str, reply: &mut Reply) {
        let Ok(node) = self.world.node(node_id) else {
            reply.say("No signal by that name.");
            return;
        };
        if self.state.enter(node_id) {
            self.state.record(format!("Entered {node_id}"));
        }
        reply.say("");
        reply.say(format!(":: {} :: {}", node.id, node.title));
        reply.say(node.desc.clone());
    }

    fn cmd_scan(&mut self, reply: &mut Reply) {
        let mut nodes: Vec<String> = self
            .state
            .discovered
            .iter()
            .filter(|id| **id != self.state.location)
            .cloned()
            .collect();
        nodes.sort();

        if nodes.is_empty() {
            reply.say("No other signals.");
            return;
        }
        reply.say("Signals:");
        for node_id in nodes {
            let Ok(check) = self.world.entry_check(&self.state, &node_id) else {
                continue;
            };
            let mut line = if check.ok() {
                format!("- {node_id} [OPEN]")
            } else {
                format!("- {node_id} [LOCKED]")
            };
            if !check.ok() {
                let mut needs = Vec::new();
                if !check.missing_items.is_empty() {
                    needs.push(format!("items: {}", check.missing_items.join(", ")));
                }
                if !check.missing_flags.is_empty() {
                    needs.push(format!("signals: {}", check.missing_flags.join(", ")));
                }
                line.push_str(&format!(" ({})", needs.join("; ")));
            }
            reply.say(line);
        }
    }

    fn cmd_connect(&mut self, target: Option<String>, reply: &mut Reply) {
        let Some(node_id) = target else {
            reply.say("Connect where?");
            return;
        };
        if !self.state.discovered.contains(&node_id) {
            reply.say("No signal by that name.");
            return;
        }
        let Ok(check) = self.world.entry_check(&self.state, &node_id) else {
            reply.say("No signal by that name.");
            return;
        };
        if !check.ok() {
            let mut needs = Vec::new();
            if !check.missing_items.is_empty() {
                needs.push(format!("items: {}", check.missing_items.join(", ")));
            }
            if !check.missing_flags.is_empty() {
                needs.push(format!("signals: {}", check.missing_flags.join(", ")));
            }
            reply.say(format!("Access denied. Missing {}.", needs.join("; ")));
            return;
        }
        self.enter(&node_id, reply);
    }

    fn cmd_ls(&self, reply: &mut Reply) {
        let files = self.current_node().map(|node| &node.files[..]).unwrap_or(&[]);
        if files.is_empty() {
            reply.say("No files in this node.");
            return;
        }
        for file in files {
            reply.say(format!("- {} ({})", file.name, file.kind.label()));
        }
    }

    fn cmd_cat(&mut self, name: Option<String>, reply: &mut Reply) {
        let Some(name) = name else {
            reply.say("Read which file?");
            return;
        };
        let Some(file) = self.current_node().and_then(|node| node.file(&name)) else {
            reply.say("File not found.");
            return;
        };
        reply.say(file.content.clone());
        if file.cipher {
            self.state.last_cipher = Some(file.content.clone());
            self.state.record(format!("Read cipher {name}"));
        }
    }

    fn cmd_download(&mut self, name: Option<String>, reply: &mut Reply) {
        let Some(name) = name else {
            reply.say("Download which file?");
            return;
        };
        let Some(file) = self.current_node().and_then(|node| node.file(&name)) else {
            reply.say("File not found.");
            return;
        };
        if !file.downloadable {
            reply.say("Nothing to download here.");
            return;
        }
        match (&file.script_id, &file.item_id) {
            (Some(script_id), _) => {
                if !self.state.add_script(script_id.clone()) {
                    reply.say("Script already in your kit.");
                    return;
                }
                self.state.record(format!("Downloaded script {script_id}"));
                reply.say(format!("Downloaded script: {script_id}"));
            }
            (None, Some(item_id)) => {
                if !self.state.grant_item(item_id.clone()) {
                    reply.say("Item already in your kit.");
                    return;
                }
                self.state.record(format!("Downloaded item {item_id}"));
                reply.say(format!("Downloaded item: {item_id}"));
            }
            (None, None) => reply.say("Nothing to download here."),
        }
    }

    fn cmd_run(&mut self, script: Option<String>, reply: &mut Reply) {
        let Some(raw) = script else {
            reply.say("Run which script?");
            return;
        };
        let script_id = raw.strip_suffix(".s").unwrap_or(&raw).to_string();

        if self.state.owns_script(&script_id) {
            let outcome = apply_script(&mut self.state, &script_id);
            self.report_outcome(outcome, reply);
            return;
        }
        // A script hosted here can run without being in the kit. The effect
        // still applies; the script is never added to the kit.
        if self
            .current_node()
            .and_then(|node| node.script_file(&script_id))
            .is_some()
        {
            let outcome = apply_script(&mut self.state, &script_id);
            self.report_outcome(outcome, reply);
            reply.say("Tip: download the script to keep it in your kit.");
            return;
        }
        reply.say("Script not found in your kit or this node.");
    }

    fn report_outcome(&self, outcome: ScriptOutcome, reply: &mut Reply) {
        match outcome {
            ScriptOutcome::Applied {
                message,
                discovered,
            } => {
                reply.say(message);
                if !discovered.is_empty() {
                    let label = if discovered.len() == 1 {
                        "New signal"
                    } else {
                        "New signals"
                    };
                    reply.say(format!("{label}: {}", discovered.join(", ")));
                }
            }
            ScriptOutcome::AlreadyApplied { message } => reply.say(message),
            ScriptOutcome::Blocked { message, .. } => reply.say(message),
            ScriptOutcome::NoResponse => reply.say("Script returned no response."),
        }
    }

    fn cmd_decode(&mut self, cipher: Option<String>, payload: Option<String>, reply: &mut Reply) {
        let Some(cipher) = cipher else {
            reply.say("Usage: decode rot13|b64 <text>");
            return;
        };
        let kind = match CipherKind::from_name(&cipher) {
            Ok(kind) => kind,
            Err(err) => {
                reply.say(err.to_string());
                return;
            }
        };
        match decode(kind, payload.as_deref(), self.state.last_cipher.as_deref()) {
            Ok(text) => {
                reply.say("Decoded:");
                reply.say(text.clone());
                unlock_sigils(&mut self.state, &text);
            }
            Err(err) => reply.say(err.to_string()),
        }
    }

    fn cmd_inventory(&self, reply: &mut Reply) {
        if self.state.scripts.is_empty() && self.state.inventory.is_empty() {
            reply.say("Your kit is empty.");
            return;
        }
        if !self.state.scripts.is_empty() {
            let mut scripts: Vec<&str> = self.state.scripts.iter().map(String::as_str).collect();
            scripts.sort_unstable();
            reply.say(format!("Scripts: {}", scripts.join(", ")));
        }
        if !self.state.inventory.is_empty() {
            let mut items: Vec<&str> = self.state.inventory.iter().map(String::as_str).collect();
            items.sort_unstable();
            reply.say(format!("Items: {}", items.join(", ")));
        }
    }

    fn cmd_profile(&self, reply: &mut Reply) {
        reply.say(format!("Handle: {}", self.state.handle));
        reply.say(format!("Location: {}", self.state.location));
        reply.say(format!(
            "Scripts: {} | Items: {}",
            self.state.scripts.len(),
            self.state.inventory.len()
        ));
        reply.say(format!("Signals: {}", self.state.discovered.len()));
    }

    fn cmd_log(&self, reply: &mut Reply) {
        if self.state.log.is_empty() {
            reply.say("Log is empty.");
            return;
        }
        for entry in &self.state.log {
            reply.say(format!("- {entry}"));
        }
    }

    fn cmd_save(&mut self, reply: &mut Reply) {
        match self.save.save(&self.state) {
            Ok(()) => {
                let name = self
                    .save
                    .path()
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.save.path().display().to_string());
                reply.say(format!("Saved to {name}"));
            }
            Err(err) => {
                warn!(error = %err, "save failed");
                reply.say(err.to_string());
            }
        }
    }

    /// All-or-nothing: the in-memory state only changes when the whole load
    /// succeeds and points at a real node.
    fn cmd_load(&mut self, reply: &mut Reply) {
        match self.save.load() {
            Ok(loaded) => {
                if !self.world.contains(&loaded.location) {
                    warn!(location = %loaded.location, "save points at an unknown node");
                    reply.say("Failed to load save file.");
                    return;
                }
                self.state = loaded;
                reply.say("Save loaded.");
                let location = self.state.location.clone();
                self.enter(&location, reply);
            }
            Err(err) => reply.say(err.to_string()),
        }
    }

    /// Endings re-print their prose freely but only mutate state once.
    fn cmd_ending(&mut self, name: &str, prose: &'static str, reply: &mut Reply) {
        if self.state.location != ENDING_NODE {
            reply.say(format!("No target to {name} here."));
            return;
        }
        reply.say(prose);
        if !self.state.ended {
            self.state.ended = true;
            self.state.record(format!("Ending: {name}"));
            info!(ending = name, "run concluded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session<'w>(world: &'w World, dir: &TempDir) -> Session<'w> {
        Session::new(
            world,
            PlayerState::fresh("drifter"),
            SaveFile::new(dir.path().join("save.json")),
        )
    }

    fn text(reply: &Reply) -> String {
        reply.lines.join("\n")
    }

    fn play(session: &mut Session<'_>, lines: &[&str]) {
        for line in lines {
            session.handle_line(line);
        }
    }

    #[test]
    fn test_undiscovered_nodes_have_no_signal() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        let reply = session.handle_line("connect market.node");
        assert_eq!(text(&reply), "No signal by that name.");
        assert_eq!(session.location(), START_NODE);
    }

    #[test]
    fn test_connect_reports_missing_requirements() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);
        play(
            &mut session,
            &["run tracer.s", "connect market.node", "download sniffer.s", "run sniffer"],
        );

        let reply = session.handle_line("connect corp.audit");
        assert_eq!(text(&reply), "Access denied. Missing signals: ghosted.");

        let reply = session.handle_line("connect lattice.cache");
        assert_eq!(
            text(&reply),
            "Access denied. Missing items: token.key, weaver.mark; signals: lattice_sigil."
        );
        assert_eq!(session.location(), "market.node");
    }

    #[test]
    fn test_scan_shows_lock_status() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        let reply = session.handle_line("scan");
        assert_eq!(text(&reply), "No other signals.");

        session.handle_line("run tracer.s");
        let reply = session.handle_line("scan");
        let listing = text(&reply);
        assert!(listing.contains("- market.node [OPEN]"));
        assert!(listing.contains("- perimeter.gate [OPEN]"));
        assert!(!listing.contains("hub.home"));
    }

    #[test]
    fn test_ls_and_cat() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        let reply = session.handle_line("ls");
        let listing = text(&reply);
        assert!(listing.contains("- readme.txt (text)"));
        assert!(listing.contains("- tracer.s (script)"));

        let reply = session.handle_line("cat message.txt");
        assert!(text(&reply).contains("SWITCHBOARD"));

        let reply = session.handle_line("cat nothing.txt");
        assert_eq!(text(&reply), "File not found.");
    }

    #[test]
    fn test_cat_caches_ciphers_for_decode() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);
        play(&mut session, &["run tracer.s", "connect perimeter.gate"]);

        session.handle_line("cat cipher.txt");
        assert!(session.state().last_cipher.is_some());
        assert!(session
            .state()
            .log
            .iter()
            .any(|entry| entry == "Read cipher cipher.txt"));

        let reply = session.handle_line("decode rot13");
        let decoded = text(&reply);
        assert!(decoded.contains("ember is the drift"));
        assert!(session.state().has_flag("ember_phrase"));
    }

    #[test]
    fn test_decode_usage_and_unknown_cipher() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        let reply = session.handle_line("decode");
        assert_eq!(text(&reply), "Usage: decode rot13|b64 <text>");

        let reply = session.handle_line("decode xor payload");
        assert_eq!(text(&reply), "Unknown cipher. Use rot13 or b64.");

        let reply = session.handle_line("decode rot13");
        assert_eq!(text(&reply), "No cached cipher. Read a cipher file first.");
    }

    #[test]
    fn test_decode_explicit_payload_sets_sigil() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        let reply = session.handle_line("decode b64 U0lHSUw6IExBVFRJQ0U=");
        assert!(text(&reply).contains("SIGIL: LATTICE"));
        assert!(session.state().has_flag("lattice_sigil"));
    }

    #[test]
    fn test_download_flows() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        let reply = session.handle_line("download tracer.s");
        assert_eq!(text(&reply), "Downloaded script: tracer");
        assert!(session.state().owns_script("tracer"));

        let reply = session.handle_line("download tracer.s");
        assert_eq!(text(&reply), "Script already in your kit.");

        let reply = session.handle_line("download readme.txt");
        assert_eq!(text(&reply), "Nothing to download here.");

        let reply = session.handle_line("download ghost.bin");
        assert_eq!(text(&reply), "File not found.");
    }

    #[test]
    fn test_run_from_node_applies_but_keeps_kit_empty() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        let reply = session.handle_line("run tracer.s");
        let output = text(&reply);
        assert!(output.contains("Tracer online. Mesh resolved."));
        assert!(output.contains("New signals: market.node, perimeter.gate"));
        assert!(output.contains("Tip: download the script to keep it in your kit."));

        assert!(session.state().has_flag("trace_open"));
        assert!(session.state().scripts.is_empty());

        let reply = session.handle_line("run sniffer");
        assert_eq!(text(&reply), "Script not found in your kit or this node.");
    }

    #[test]
    fn test_save_then_load_restores_the_snapshot() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);
        play(&mut session, &["download tracer.s", "run tracer", "save"]);

        // Drift further, then load the snapshot back.
        play(&mut session, &["connect market.node", "download spoof.s", "run spoof"]);
        assert!(session.state().has_item("mask.dat"));

        let reply = session.handle_line("load");
        let output = text(&reply);
        assert!(output.contains("Save loaded."));
        assert!(output.contains(":: hub.home :: HUB/HOME"));
        assert!(!session.state().has_item("mask.dat"));
        assert!(session.state().has_flag("trace_open"));
    }

    #[test]
    fn test_load_failure_leaves_state_alone() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);
        session.handle_line("run tracer.s");

        let reply = session.handle_line("load");
        assert_eq!(text(&reply), "No save file found.");
        assert!(session.state().has_flag("trace_open"));

        std::fs::write(dir.path().join("save.json"), "{ broken").unwrap();
        let reply = session.handle_line("load");
        assert_eq!(text(&reply), "Failed to load save file.");
        assert!(session.state().has_flag("trace_open"));
    }

    #[test]
    fn test_endings_need_the_core() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        let reply = session.handle_line("exfiltrate");
        assert_eq!(text(&reply), "No target to exfiltrate here.");
        let reply = session.handle_line("restore");
        assert_eq!(text(&reply), "No target to restore here.");
        assert!(!session.state().ended);
    }

    #[test]
    fn test_unknown_and_malformed_commands() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        let reply = session.handle_line("teleport core");
        assert_eq!(text(&reply), "Unknown command. Type help for options.");

        let reply = session.handle_line("cat \"unclosed");
        assert_eq!(text(&reply), "Malformed command.");

        let reply = session.handle_line("   ");
        assert!(reply.lines.is_empty());
        assert!(!reply.quit);
    }

    #[test]
    fn test_quit_signals_the_loop() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        let mut session = session(&world, &dir);

        assert!(session.handle_line("quit").quit);
        assert!(session.handle_line("q").quit);
    }

    #[test]
    fn test_full_walkthrough_to_exfiltration() {
        let world = World::load().unwrap();
        let dir = TempDir::new().unwrap();
        // No script sweeps the archive's band; seed its signal the way a
        // drifted save would carry it. Everything else is discovered in play.
        let mut state = PlayerState::fresh("drifter");
        state.discover(["archives.arc"]);
        let mut session = Session::new(&world, state, SaveFile::new(dir.path().join("save.json")));

        play(
            &mut session,
            &[
                "download tracer.s",
                "run tracer",
                "connect market.node",
                "download sniffer.s",
                "run sniffer",
                "download spoof.s",
                "run spoof",
                "connect perimeter.gate",
                "download badge.sig",
                "cat cipher.txt",
                "decode rot13",
                "connect archives.arc",
                "cat key.b64",
                "decode b64",
                "run fork.s",
                "connect weaver.den",
                "download weaver.mark",
                "run splice.s",
                "run ghost.s",
                "connect corp.audit",
                "download relay.shard",
                "connect lattice.cache",
                "download relic.key",
            ],
        );

        let state = session.state();
        assert_eq!(state.inventory.len(), 6, "all items collected: {:?}", state.inventory);
        for flag in [
            "trace_open",
            "sniffer_run",
            "ember_phrase",
            "lattice_sigil",
            "forked",
            "ghosted",
        ] {
            assert!(state.has_flag(flag), "missing flag {flag}");
        }

        let reply = session.handle_line("connect core.relic");
        assert!(text(&reply).contains(":: core.relic :: CORE RELIC"));

        let reply = session.handle_line("exfiltrate");
        assert!(text(&reply).contains("You lift the relic into your shell."));
        assert!(session.state().ended);
        assert!(session
            .state()
            .log
            .iter()
            .any(|entry| entry == "Ending: exfiltrate"));

        // A second ending re-prints prose but is a state no-op.
        let log_len = session.state().log.len();
        let reply = session.handle_line("restore");
        assert!(text(&reply).contains("You bind the relic back to the Drift."));
        assert!(session.state().ended);
        assert_eq!(session.state().log.len(), log_len);

        // The drift stays browsable after the ending.
        let reply = session.handle_line("scan");
        assert!(text(&reply).contains("[OPEN]"));
        assert_eq!(session.state().discovered.len(), 8);
    }
}
