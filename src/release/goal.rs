//! Goal parsing and goal-set resolution.
//!
//! A platform declares any combination of `package`, `push` and `save`.
//! [`GoalSet::steps`] maps the declared set onto the ordered list of steps
//! that actually run, through a table with one row per subset.

use std::fmt;

/// A release goal declared in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Goal {
    /// Produce the platform-native artifact.
    Package,
    /// Upload the artifact to a remote repository.
    Push,
    /// Export the artifact together with its images into a release archive.
    Save,
}

impl Goal {
    /// All goals, in execution order.
    pub const ALL: [Goal; 3] = [Goal::Package, Goal::Push, Goal::Save];

    /// Parses a configured token. Unknown tokens yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|goal| goal.as_str().eq_ignore_ascii_case(token))
    }

    /// Canonical lowercase token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Package => "package",
            Goal::Push => "push",
            Goal::Save => "save",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Goal::Package => 0b001,
            Goal::Push => 0b010,
            Goal::Save => 0b100,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step executed by a packager pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Package step
    Package,
    /// Push step
    Push,
    /// Save step
    Save,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Package => "package",
            Step::Push => "push",
            Step::Save => "save",
        })
    }
}

/// Step plan for every subset of goals, indexed by membership bitmask
/// (package = 1, push = 2, save = 4). Push and save always package first.
const STEP_TABLE: [&[Step]; 8] = [
    /* {}                   */ &[],
    /* {package}            */ &[Step::Package],
    /* {push}               */ &[Step::Package, Step::Push],
    /* {package,push}       */ &[Step::Package, Step::Push],
    /* {save}               */ &[Step::Package, Step::Save],
    /* {package,save}       */ &[Step::Package, Step::Save],
    /* {push,save}          */ &[Step::Package, Step::Push, Step::Save],
    /* {package,push,save}  */ &[Step::Package, Step::Push, Step::Save],
];

/// Deduplicated set of recognized goals for one platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GoalSet {
    bits: u8,
}

impl GoalSet {
    /// Builds the set from raw tokens, dropping unknown ones.
    pub fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for token in tokens {
            match Goal::from_token(token.as_ref()) {
                Some(goal) => set.insert(goal),
                None => log::debug!("Ignoring unknown goal token {:?}", token.as_ref()),
            }
        }
        set
    }

    /// Adds a goal.
    pub fn insert(&mut self, goal: Goal) {
        self.bits |= goal.bit();
    }

    /// Returns true when `goal` was declared.
    pub fn contains(&self, goal: Goal) -> bool {
        self.bits & goal.bit() != 0
    }

    /// Number of distinct recognized goals.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Returns true when no goal was recognized.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Declared goals in canonical order.
    pub fn goals(&self) -> impl Iterator<Item = Goal> + '_ {
        Goal::ALL.into_iter().filter(|goal| self.contains(*goal))
    }

    /// Ordered steps to run for this set.
    pub fn steps(&self) -> &'static [Step] {
        STEP_TABLE[self.bits as usize]
    }
}

impl fmt::Display for GoalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let goals: Vec<&str> = self.goals().map(|g| g.as_str()).collect();
        write!(f, "[{}]", goals.join(", "))
    }
}
