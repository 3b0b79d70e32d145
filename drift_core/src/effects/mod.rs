//! Script effects - the progression engine.
//!
//! Every runnable script resolves to a [`ScriptKind`] variant whose behavior
//! is a declarative [`EffectSpec`] record: an idempotence guard, required
//! items, one effect, a discovery list, and the lines it speaks. The
//! interpreter in [`ScriptKind::apply`] is the only code path; the table is
//! data, so tests can exercise the records independently of dispatch.

use tracing::debug;

use game_world::PlayerState;

/// Idempotence guard: the script refuses to re-apply once this holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    ItemHeld(&'static str),
    FlagSet(&'static str),
}

/// The single state mutation a script performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    GrantItem(&'static str),
    RaiseFlag(&'static str),
}

/// Declarative description of one script's behavior.
#[derive(Debug, Clone, Copy)]
pub struct EffectSpec {
    /// Re-run refusal condition, if the script has one.
    pub guard: Option<Guard>,
    /// Reply when the guard already holds.
    pub already: &'static str,
    /// Items that must all be held before the effect applies, in report order.
    pub requires: &'static [&'static str],
    /// Reply prefix when requirements are missing.
    pub blocked: &'static str,
    pub effect: Effect,
    /// Nodes revealed on a successful run.
    pub discovers: &'static [&'static str],
    /// Reply on a successful run.
    pub applied: &'static str,
    /// Activity-log line on a successful run.
    pub event: &'static str,
}

/// Outcome of running a script against player state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// The effect applied; `discovered` lists newly revealed nodes.
    Applied {
        message: String,
        discovered: Vec<String>,
    },
    /// The idempotence guard held; nothing changed.
    AlreadyApplied { message: String },
    /// Requirements were missing; nothing changed.
    Blocked {
        message: String,
        missing: Vec<String>,
    },
    /// Unknown script id; nothing changed.
    NoResponse,
}

/// Scripts the engine knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Tracer,
    Spoof,
    Sniffer,
    Splice,
    Ghost,
    Fork,
}

impl ScriptKind {
    pub const ALL: [ScriptKind; 6] = [
        ScriptKind::Tracer,
        ScriptKind::Spoof,
        ScriptKind::Sniffer,
        ScriptKind::Splice,
        ScriptKind::Ghost,
        ScriptKind::Fork,
    ];

    /// Resolve a script id from the world data.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "tracer" => Some(ScriptKind::Tracer),
            "spoof" => Some(ScriptKind::Spoof),
            "sniffer" => Some(ScriptKind::Sniffer),
            "splice" => Some(ScriptKind::Splice),
            "ghost" => Some(ScriptKind::Ghost),
            "fork" => Some(ScriptKind::Fork),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            ScriptKind::Tracer => "tracer",
            ScriptKind::Spoof => "spoof",
            ScriptKind::Sniffer => "sniffer",
            ScriptKind::Splice => "splice",
            ScriptKind::Ghost => "ghost",
            ScriptKind::Fork => "fork",
        }
    }

    /// The declarative behavior record for this script.
    pub fn spec(&self) -> EffectSpec {
        match self {
            // Re-running tracer is safe: it re-applies and re-logs, and the
            // discovery list simply comes back empty.
            ScriptKind::Tracer => EffectSpec {
                guard: None,
                already: "",
                requires: &[],
                blocked: "",
                effect: Effect::RaiseFlag("trace_open"),
                discovers: &["market.node", "perimeter.gate"],
                applied: "Tracer online. Mesh resolved.",
                event: "Tracer mapped the perimeter",
            },
            ScriptKind::Spoof => EffectSpec {
                guard: Some(Guard::ItemHeld("mask.dat")),
                already: "Mask already minted.",
                requires: &[],
                blocked: "",
                effect: Effect::GrantItem("mask.dat"),
                discovers: &[],
                applied: "Mask minted: mask.dat",
                event: "Minted mask.dat",
            },
            ScriptKind::Sniffer => EffectSpec {
                guard: Some(Guard::FlagSet("sniffer_run")),
                already: "Sniffer already swept the quiet bands.",
                requires: &[],
                blocked: "",
                effect: Effect::RaiseFlag("sniffer_run"),
                discovers: &["weaver.den", "corp.audit", "lattice.cache"],
                applied: "Sniffer pulse complete.",
                event: "Sniffer swept the quiet bands",
            },
            ScriptKind::Splice => EffectSpec {
                guard: Some(Guard::ItemHeld("token.key")),
                already: "Token already forged.",
                requires: &["badge.sig", "mask.dat", "weaver.mark"],
                blocked: "Splice failed. Missing:",
                effect: Effect::GrantItem("token.key"),
                discovers: &[],
                applied: "Token forged: token.key",
                event: "Spliced token.key",
            },
            ScriptKind::Ghost => EffectSpec {
                guard: Some(Guard::FlagSet("ghosted")),
                already: "Ghost protocol already active.",
                requires: &["weaver.mark"],
                blocked: "Ghost protocol requires",
                effect: Effect::RaiseFlag("ghosted"),
                discovers: &["corp.audit"],
                applied: "Ghost protocol active. Your trail is cold.",
                event: "Ghosted the audit trail",
            },
            ScriptKind::Fork => EffectSpec {
                guard: Some(Guard::FlagSet("forked")),
                already: "Relay already forked.",
                requires: &[],
                blocked: "",
                effect: Effect::RaiseFlag("forked"),
                discovers: &["core.relic"],
                applied: "Relay forked. Core channel exposed.",
                event: "Forked the relay to the core",
            },
        }
    }

    /// Run this script's effect against player state.
    pub fn apply(&self, state: &mut PlayerState) -> ScriptOutcome {
        let spec = self.spec();

        if let Some(guard) = spec.guard {
            let held = match guard {
                Guard::ItemHeld(item) => state.has_item(item),
                Guard::FlagSet(flag) => state.has_flag(flag),
            };
            if held {
                return ScriptOutcome::AlreadyApplied {
                    message: spec.already.to_string(),
                };
            }
        }

        let missing: Vec<String> = spec
            .requires
            .iter()
            .filter(|item| !state.has_item(item))
            .map(|item| item.to_string())
            .collect();
        if !missing.is_empty() {
            return ScriptOutcome::Blocked {
                message: format!("{} {}", spec.blocked, missing.join(", ")),
                missing,
            };
        }

        match spec.effect {
            Effect::GrantItem(item) => {
                state.grant_item(item);
            }
            Effect::RaiseFlag(flag) => {
                state.raise_flag(flag);
            }
        }
        let discovered = state.discover(spec.discovers.iter().copied());
        state.record(spec.event);
        debug!(script = self.id(), ?discovered, "script applied");

        ScriptOutcome::Applied {
            message: spec.applied.to_string(),
            discovered,
        }
    }
}

/// Run a script by id. Unknown ids get a neutral no-response outcome and
/// leave state untouched.
pub fn apply_script(state: &mut PlayerState, script_id: &str) -> ScriptOutcome {
    match ScriptKind::from_id(script_id) {
        Some(kind) => kind.apply(state),
        None => ScriptOutcome::NoResponse,
    }
}
