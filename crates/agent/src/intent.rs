use regex::RegexSet;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Normal,
    High,
}

/// Advisory signals derived from one message. Never persisted, never used
/// to select tools; they only feed the risk scorer and the logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IntentSignals {
    pub needs_restart: bool,
    pub needs_upload: bool,
    pub needs_audit: bool,
    pub needs_human: bool,
    pub urgency: Urgency,
}

/// Fixed pattern groups per signal, with the Spanish variants the service
/// historically supported.
const RESTART_PATTERNS: &[&str] = &[
    r"\bslow\b",
    r"\brestart\b",
    r"\breboot\b",
    r"\bfrozen\b",
    r"\bfreez",
    r"\bstuck\b",
    r"\bnot responding\b",
    r"\bcrash",
    r"\blento\b",
    r"\breiniciar\b",
    r"\bcongelad[oa]\b",
    r"\bno responde\b",
];

const UPLOAD_PATTERNS: &[&str] = &[
    r"\bupload\b",
    r"\battach",
    r"\bsend (?:you )?(?:a |the )?(?:file|screenshot|photo|document)\b",
    r"\bsubir\b",
    r"\badjuntar\b",
    r"\barchivo\b",
];

const AUDIT_PATTERNS: &[&str] = &[
    r"\blogs?\b",
    r"\bactivity\b",
    r"\bhistory\b",
    r"\baudit\b",
    r"\bregistros?\b",
    r"\bactividad\b",
    r"\bhistorial\b",
];

const HUMAN_PATTERNS: &[&str] = &[
    r"\bhuman\b",
    r"\bperson\b",
    r"\bagent\b",
    r"\bescalate\b",
    r"\btalk to someone\b",
    r"\bspeak (?:to|with)\b",
    r"\bpersona\b",
    r"\bhumano\b",
    r"\bescalar\b",
];

const URGENCY_PATTERNS: &[&str] = &[
    r"\burgent",
    r"\bcritical\b",
    r"\bemergency\b",
    r"\bnow\b",
    r"\bimmediate",
    r"\basap\b",
    r"\burgente\b",
    r"\bcr[ií]tico\b",
    r"\bemergencia\b",
    r"\bahora\b",
    r"\binmediato\b",
];

pub struct IntentDetector {
    restart: RegexSet,
    upload: RegexSet,
    audit: RegexSet,
    human: RegexSet,
    urgency: RegexSet,
}

impl IntentDetector {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            restart: RegexSet::new(RESTART_PATTERNS)?,
            upload: RegexSet::new(UPLOAD_PATTERNS)?,
            audit: RegexSet::new(AUDIT_PATTERNS)?,
            human: RegexSet::new(HUMAN_PATTERNS)?,
            urgency: RegexSet::new(URGENCY_PATTERNS)?,
        })
    }

    pub fn detect(&self, text: &str) -> IntentSignals {
        let lowered = text.to_lowercase();
        IntentSignals {
            needs_restart: self.restart.is_match(&lowered),
            needs_upload: self.upload.is_match(&lowered),
            needs_audit: self.audit.is_match(&lowered),
            needs_human: self.human.is_match(&lowered),
            urgency: if self.urgency.is_match(&lowered) { Urgency::High } else { Urgency::Normal },
        }
    }
}
