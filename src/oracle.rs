//! Size-dispatched primality oracle.
//!
//! Numbers below [`DEFAULT_THRESHOLD_BITS`] are tested in-process with BPSW.
//! Anything larger goes to an external PRP tool, which is self-checked once
//! per oracle before its first answer is trusted.

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use gapverify_pfgw::{Pfgw, Probe, PrpTool, default_probes, self_check};
use num_bigint::BigUint;
use tracing::instrument;

use crate::config::VerifyConfig;
use crate::error::{Result, VerifyError};
use crate::primality;

/// Bit length at which the external tool takes over.
pub const DEFAULT_THRESHOLD_BITS: u64 = 8000;

/// How a number gets tested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// In-process BPSW.
    FastPath,
    /// External PRP tool.
    ExternalTool,
}

impl Strategy {
    /// `bits < threshold_bits` ⇒ [`Strategy::FastPath`].
    #[must_use]
    pub const fn for_bits(bits: u64, threshold_bits: u64) -> Self {
        if bits < threshold_bits {
            Self::FastPath
        } else {
            Self::ExternalTool
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FastPath => write!(f, "fast-path"),
            Self::ExternalTool => write!(f, "external-tool"),
        }
    }
}

/// Primality oracle. `Send + Sync`; one instance can serve several
/// validations at once.
pub struct PrimalityOracle {
    threshold_bits: u64,
    tool: Box<dyn PrpTool>,
    probes: Vec<Probe>,
    probe_before_use: bool,
    availability: OnceLock<bool>,
}

impl fmt::Debug for PrimalityOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimalityOracle")
            .field("threshold_bits", &self.threshold_bits)
            .field("tool", &self.tool.name())
            .field("probes", &self.probes.len())
            .field("probe_before_use", &self.probe_before_use)
            .field("availability", &self.availability.get())
            .finish()
    }
}

impl Default for PrimalityOracle {
    fn default() -> Self {
        Self::with_tool(Pfgw::default())
    }
}

impl PrimalityOracle {
    /// Oracle backed by `tool` with default threshold and probes.
    pub fn with_tool(tool: impl PrpTool + 'static) -> Self {
        Self {
            threshold_bits: DEFAULT_THRESHOLD_BITS,
            tool: Box::new(tool),
            probes: default_probes(),
            probe_before_use: true,
            availability: OnceLock::new(),
        }
    }

    /// Oracle built from the `[oracle]` and `[pfgw]` config sections.
    #[must_use]
    pub fn from_config(config: &VerifyConfig) -> Self {
        let pfgw = &config.pfgw;
        let timeout = (pfgw.timeout_seconds > 0).then(|| Duration::from_secs(pfgw.timeout_seconds));
        let tool = Pfgw::new(&pfgw.program)
            .with_marker(pfgw.marker.clone())
            .with_timeout(timeout);
        Self::with_tool(tool)
            .with_threshold_bits(config.oracle.threshold_bits)
            .with_probes(pfgw.effective_probes())
            .with_probe_before_use(config.oracle.probe_before_use)
    }

    #[must_use]
    pub const fn with_threshold_bits(mut self, threshold_bits: u64) -> Self {
        self.threshold_bits = threshold_bits;
        self
    }

    #[must_use]
    pub fn with_probes(mut self, probes: Vec<Probe>) -> Self {
        self.probes = probes;
        self
    }

    #[must_use]
    pub const fn with_probe_before_use(mut self, probe_before_use: bool) -> Self {
        self.probe_before_use = probe_before_use;
        self
    }

    pub const fn threshold_bits(&self) -> u64 {
        self.threshold_bits
    }

    pub fn tool(&self) -> &dyn PrpTool {
        self.tool.as_ref()
    }

    pub fn strategy_for(&self, n: &BigUint) -> Strategy {
        Strategy::for_bits(n.bits(), self.threshold_bits)
    }

    /// Same as [`is_prime_large`](Self::is_prime_large) without a textual form.
    ///
    /// # Errors
    /// See [`is_prime_large`](Self::is_prime_large).
    pub fn is_prime(&self, n: &BigUint) -> Result<bool> {
        self.is_prime_large(n, None)
    }

    /// Probable-prime test of `n`. `original_text` is handed to the external
    /// tool verbatim when present (`"503#-659"` is far shorter than its
    /// digits); the fast path ignores it.
    ///
    /// # Errors
    /// [`VerifyError::ToolUnavailable`] when the tool fails its self-check,
    /// [`VerifyError::Tool`] when an invocation fails or its output lacks the
    /// marker.
    #[instrument(skip_all, fields(bits = n.bits()))]
    pub fn is_prime_large(&self, n: &BigUint, original_text: Option<&str>) -> Result<bool> {
        match self.strategy_for(n) {
            Strategy::FastPath => Ok(primality::is_probable_prime(n)),
            Strategy::ExternalTool => {
                self.require_tool()?;
                let query = original_text.map_or_else(|| Cow::Owned(n.to_string()), Cow::Borrowed);
                let verdict = self.tool.test_prp(&query)?;
                Ok(verdict.is_probable_prime())
            }
        }
    }

    /// `true` if the external tool passes every probe. Runs the probes at
    /// most once per oracle.
    pub fn check_tool_available(&self) -> bool {
        *self.availability.get_or_init(|| {
            let ok = self_check(self.tool.as_ref(), &self.probes);
            if ok {
                tracing::info!(tool = self.tool.name(), "PRP tool passed self-check");
            } else {
                tracing::warn!(tool = self.tool.name(), "PRP tool failed self-check");
            }
            ok
        })
    }

    fn require_tool(&self) -> Result<()> {
        if !self.probe_before_use || self.check_tool_available() {
            return Ok(());
        }
        Err(VerifyError::ToolUnavailable {
            program: self.tool.name().to_owned(),
        })
    }
}
