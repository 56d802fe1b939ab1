//! Pure state machine for the generation-validation workshop
//!
//! One machine drives one draft:
//! `Generating -> AuditingCost -> AuditingNutrition -> Accepted`, where any
//! step may send the draft back to `Generating` with a feedback note until the
//! iteration bound is reached, and then to `Failed`.
//!
//! - Pure function: transition(state, event) -> (state, actions)
//! - No async, no I/O
//! - Invalid transitions go to Failed state (never panic)

/// Feedback recorded when the generator's answer is not a usable recipe
pub const PARSE_FAILURE_NOTE: &str = "JSON format error";

/// Workshop state; `iteration` is 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Waiting for the generator's recipe
    Generating { iteration: usize },
    /// Waiting for the cost/logistics verdict
    AuditingCost { iteration: usize },
    /// Waiting for the nutrition/compliance verdict
    AuditingNutrition { iteration: usize },
    /// Both auditors approved in the same iteration
    Accepted { iterations: usize },
    /// Iteration bound reached or invalid transition
    Failed { reason: String },
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Accepted { .. } | State::Failed { .. })
    }
}

/// Outcomes reported by the workshop engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Generator produced a well-formed recipe
    Generated { dish_name: String },
    /// Generator output was unreadable or had no dish name
    GenerationUnusable,
    CostApproved,
    /// `note` is the full feedback line, auditor label included
    CostRejected { note: String },
    NutritionApproved { calories: Option<String> },
    NutritionRejected { note: String },
}

/// Side effects for the engine to carry out, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    RunGenerator { iteration: usize },
    RunCostAudit,
    RunNutritionAudit,
    AppendFeedback { note: String },
    Accept { calories: Option<String> },
    LogActivity { message: String },
}

/// Transition rules with a fixed iteration bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkshopMachine {
    max_iterations: usize,
}

impl Default for WorkshopMachine {
    fn default() -> Self {
        Self::new(3)
    }
}

impl WorkshopMachine {
    /// A bound of zero is raised to one
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Initial state and the actions that start it
    pub fn start(&self) -> (State, Vec<Action>) {
        (
            State::Generating { iteration: 1 },
            vec![Action::RunGenerator { iteration: 1 }],
        )
    }

    /// Pure state transition function
    ///
    /// Takes current state and event, returns new state and actions to
    /// execute. Any invalid transition results in a Failed state with a
    /// descriptive reason. This function never panics.
    pub fn transition(&self, state: State, event: Event) -> (State, Vec<Action>) {
        match (state, event) {
            (State::Generating { iteration }, Event::Generated { dish_name }) => (
                State::AuditingCost { iteration },
                vec![
                    Action::LogActivity {
                        message: format!("Draft '{}' ready (iteration {})", dish_name, iteration),
                    },
                    Action::RunCostAudit,
                ],
            ),

            (State::Generating { iteration }, Event::GenerationUnusable) => {
                self.retry_or_fail(iteration, PARSE_FAILURE_NOTE.to_string())
            }

            (State::AuditingCost { iteration }, Event::CostApproved) => (
                State::AuditingNutrition { iteration },
                vec![Action::RunNutritionAudit],
            ),

            (State::AuditingCost { iteration }, Event::CostRejected { note }) => {
                self.retry_or_fail(iteration, note)
            }

            (State::AuditingNutrition { iteration }, Event::NutritionApproved { calories }) => (
                State::Accepted {
                    iterations: iteration,
                },
                vec![
                    Action::Accept { calories },
                    Action::LogActivity {
                        message: format!("Draft accepted after {} iteration(s)", iteration),
                    },
                ],
            ),

            (State::AuditingNutrition { iteration }, Event::NutritionRejected { note }) => {
                self.retry_or_fail(iteration, note)
            }

            // Terminal states - no valid transitions
            (State::Accepted { iterations }, event) => (
                State::Failed {
                    reason: format!(
                        "Invalid transition from Accepted state (after {} iterations) on event: {:?}",
                        iterations, event
                    ),
                },
                vec![],
            ),

            (State::Failed { reason }, event) => (
                State::Failed {
                    reason: format!(
                        "Invalid transition from Failed state (reason: {}) on event: {:?}",
                        reason, event
                    ),
                },
                vec![],
            ),

            // All other invalid transitions
            (state, event) => (
                State::Failed {
                    reason: format!(
                        "Invalid state transition: {:?} cannot handle event {:?}",
                        state, event
                    ),
                },
                vec![],
            ),
        }
    }

    /// Record the note, then regenerate or give up at the bound
    fn retry_or_fail(&self, iteration: usize, note: String) -> (State, Vec<Action>) {
        if iteration >= self.max_iterations {
            let actions = vec![
                Action::AppendFeedback { note: note.clone() },
                Action::LogActivity {
                    message: format!("Giving up after {} iteration(s): {}", iteration, note),
                },
            ];
            return (
                State::Failed {
                    reason: format!("Iteration bound {} reached", self.max_iterations),
                },
                actions,
            );
        }

        let next = iteration + 1;
        (
            State::Generating { iteration: next },
            vec![
                Action::AppendFeedback { note },
                Action::RunGenerator { iteration: next },
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated() -> Event {
        Event::Generated {
            dish_name: "Bigos".to_string(),
        }
    }

    #[test]
    fn test_happy_path() {
        let machine = WorkshopMachine::default();
        let (state, actions) = machine.start();
        assert_eq!(state, State::Generating { iteration: 1 });
        assert_eq!(actions, vec![Action::RunGenerator { iteration: 1 }]);

        let (state, actions) = machine.transition(state, generated());
        assert_eq!(state, State::AuditingCost { iteration: 1 });
        assert!(matches!(actions[0], Action::LogActivity { .. }));
        assert_eq!(actions[1], Action::RunCostAudit);

        let (state, actions) = machine.transition(state, Event::CostApproved);
        assert_eq!(state, State::AuditingNutrition { iteration: 1 });
        assert_eq!(actions, vec![Action::RunNutritionAudit]);

        let (state, actions) = machine.transition(
            state,
            Event::NutritionApproved {
                calories: Some("650".to_string()),
            },
        );
        assert_eq!(state, State::Accepted { iterations: 1 });
        assert!(state.is_terminal());
        assert_eq!(
            actions[0],
            Action::Accept {
                calories: Some("650".to_string())
            }
        );
    }

    #[test]
    fn test_rejection_regenerates_with_feedback() {
        let machine = WorkshopMachine::default();
        let (state, actions) = machine.transition(
            State::AuditingCost { iteration: 1 },
            Event::CostRejected {
                note: "Logistics: too pricey".to_string(),
            },
        );
        assert_eq!(state, State::Generating { iteration: 2 });
        assert_eq!(
            actions,
            vec![
                Action::AppendFeedback {
                    note: "Logistics: too pricey".to_string()
                },
                Action::RunGenerator { iteration: 2 },
            ]
        );
    }

    #[test]
    fn test_unusable_generation_counts_toward_bound() {
        let machine = WorkshopMachine::new(2);
        let (state, actions) =
            machine.transition(State::Generating { iteration: 1 }, Event::GenerationUnusable);
        assert_eq!(state, State::Generating { iteration: 2 });
        assert_eq!(
            actions[0],
            Action::AppendFeedback {
                note: PARSE_FAILURE_NOTE.to_string()
            }
        );

        let (state, _) = machine.transition(state, Event::GenerationUnusable);
        assert!(matches!(state, State::Failed { .. }));
    }

    #[test]
    fn test_bound_reached_fails_and_keeps_note() {
        let machine = WorkshopMachine::new(3);
        let (state, actions) = machine.transition(
            State::AuditingNutrition { iteration: 3 },
            Event::NutritionRejected {
                note: "Nutrition: meat in a vegetarian dish".to_string(),
            },
        );
        assert!(matches!(state, State::Failed { .. }));
        assert!(actions.contains(&Action::AppendFeedback {
            note: "Nutrition: meat in a vegetarian dish".to_string()
        }));
        assert!(!actions
            .iter()
            .any(|a| matches!(a, Action::RunGenerator { .. })));
    }

    #[test]
    fn test_invalid_transitions_fail() {
        let machine = WorkshopMachine::default();

        let (state, actions) = machine.transition(State::Generating { iteration: 1 }, Event::CostApproved);
        assert!(matches!(state, State::Failed { .. }));
        assert!(actions.is_empty());

        let (state, _) = machine.transition(State::Accepted { iterations: 1 }, generated());
        assert!(matches!(state, State::Failed { .. }));

        let (state, _) = machine.transition(
            State::Failed {
                reason: "x".to_string(),
            },
            Event::CostApproved,
        );
        assert!(matches!(state, State::Failed { .. }));
    }

    #[test]
    fn test_zero_bound_is_raised() {
        assert_eq!(WorkshopMachine::new(0).max_iterations(), 1);
    }
}
