//! Pipeline phases and their legal transitions

/// Phase of one generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fetching grounded examples, one retrieval per topic
    Retrieving,
    /// Drafting every topic not yet frozen
    Generating,
    /// Scoring the just-drafted sections
    Reviewing,
    /// A regeneration round was granted for the failing topics
    Iterating,
    /// Every topic passed review
    Accepted,
    /// Round limit reached with topics still failing
    Exhausted,
}

/// Legal transitions out of a phase
#[must_use]
pub fn allowed_transitions(from: Phase) -> &'static [Phase] {
    use Phase::{Accepted, Exhausted, Generating, Iterating, Retrieving, Reviewing};
    match from {
        Retrieving => &[Generating],
        Generating => &[Reviewing],
        Reviewing => &[Accepted, Iterating, Exhausted],
        Iterating => &[Generating],
        Accepted | Exhausted => &[],
    }
}

/// Advance a phase, asserting the transition is legal
pub(crate) fn transition(phase: &mut Phase, to: Phase) {
    debug_assert!(
        allowed_transitions(*phase).contains(&to),
        "illegal phase transition {phase:?} -> {to:?}"
    );
    tracing::debug!(from = ?phase, to = ?to, "phase transition");
    *phase = to;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases_have_no_exits() {
        assert!(allowed_transitions(Phase::Accepted).is_empty());
        assert!(allowed_transitions(Phase::Exhausted).is_empty());
    }

    #[test]
    fn review_branches_three_ways() {
        let exits = allowed_transitions(Phase::Reviewing);
        assert!(exits.contains(&Phase::Accepted));
        assert!(exits.contains(&Phase::Iterating));
        assert!(exits.contains(&Phase::Exhausted));
    }

    #[test]
    fn iteration_loops_back_to_generation() {
        assert_eq!(allowed_transitions(Phase::Iterating), &[Phase::Generating]);
    }

    #[test]
    fn legal_transition_advances() {
        let mut phase = Phase::Retrieving;
        transition(&mut phase, Phase::Generating);
        assert_eq!(phase, Phase::Generating);
    }

    #[test]
    #[should_panic(expected = "illegal phase transition")]
    fn illegal_transition_panics_in_debug() {
        let mut phase = Phase::Accepted;
        transition(&mut phase, Phase::Generating);
    }
}
