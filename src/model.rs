/// Infection status of an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    Susceptible,
    /// Infected for `days` days, out of an infectious `duration`.
    Infected { days: u32, duration: f64 },
    Recovered,
    Deceased,
}

/// Agent of the simulation.
///
/// Agents are only mutated through [`crate::population::Population`], which
/// keeps its index sets in step with each agent's status.
#[derive(Debug, Clone)]
pub struct Agent {
    id: usize,
    profile: usize,
    status: Status,
}

impl Agent {
    /// Create a new susceptible agent.
    pub fn new(id: usize, profile: usize) -> Self {
        Self {
            id,
            profile,
            status: Status::Susceptible,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Index of the agent's social profile.
    pub fn profile(&self) -> usize {
        self.profile
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_susceptible(&self) -> bool {
        self.status == Status::Susceptible
    }

    /// Number of days infected, if infected.
    pub fn days_infected(&self) -> Option<u32> {
        match self.status {
            Status::Infected { days, .. } => Some(days),
            _ => None,
        }
    }

    /// Infected for longer than the infectious duration.
    pub fn is_expired(&self) -> bool {
        match self.status {
            Status::Infected { days, duration } => days as f64 > duration,
            _ => false,
        }
    }

    pub(crate) fn infect(&mut self, duration: f64) {
        self.status = Status::Infected { days: 1, duration };
    }

    pub(crate) fn recover(&mut self) {
        debug_assert!(matches!(self.status, Status::Infected { .. }));
        self.status = Status::Recovered;
    }

    pub(crate) fn die(&mut self) {
        debug_assert!(matches!(self.status, Status::Infected { .. }));
        self.status = Status::Deceased;
    }

    pub(crate) fn advance_day(&mut self) {
        if let Status::Infected { days, .. } = &mut self.status {
            *days += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_agent_is_susceptible() {
        let agt = Agent::new(3, 1);
        assert_eq!(agt.id(), 3);
        assert_eq!(agt.profile(), 1);
        assert!(agt.is_susceptible());
        assert_eq!(agt.days_infected(), None);
        assert!(!agt.is_expired());
    }

    #[test]
    fn infection_runs_its_course() {
        let mut agt = Agent::new(0, 0);
        agt.infect(2.5);
        assert_eq!(
            agt.status(),
            Status::Infected {
                days: 1,
                duration: 2.5
            }
        );

        agt.advance_day();
        assert_eq!(agt.days_infected(), Some(2));
        assert!(!agt.is_expired());

        agt.advance_day();
        assert_eq!(agt.days_infected(), Some(3));
        assert!(agt.is_expired());

        agt.recover();
        assert_eq!(agt.status(), Status::Recovered);
        assert_eq!(agt.days_infected(), None);
    }

    #[test]
    fn advance_day_ignores_non_infected_agents() {
        let mut agt = Agent::new(0, 0);
        agt.advance_day();
        assert_eq!(agt.status(), Status::Susceptible);

        agt.infect(1.0);
        agt.advance_day();
        agt.die();
        agt.advance_day();
        assert_eq!(agt.status(), Status::Deceased);
    }

    #[test]
    fn integer_duration_expires_one_day_after_reaching_it() {
        let mut agt = Agent::new(0, 0);
        agt.infect(3.0);
        agt.advance_day();
        agt.advance_day();
        assert_eq!(agt.days_infected(), Some(3));
        assert!(!agt.is_expired());
        agt.advance_day();
        assert!(agt.is_expired());
    }
}
