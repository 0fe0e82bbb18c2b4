use crate::Placement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ExecutionMode {
    /// Every rank works on its own local tensors.
    Mirrored,
    /// Tensors carry a logical shape, placement and SBP signature.
    Consistent,
}

#[derive(derive_new::new, Debug, Clone, PartialEq)]
pub struct Scope {
    placement: Placement,
    mode: ExecutionMode,
}

impl Scope {
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

/// # Session
///
/// Execution context for one process rank, passed explicitly to everything
/// that needs a default placement or the current execution mode.
#[derive(Debug, Clone)]
pub struct Session {
    rank: usize,
    root: Scope,
    stack: Vec<Scope>,
}

impl Session {
    /// Starts in mirrored mode with `placement` as the default.
    pub fn new(rank: usize, placement: Placement) -> Self {
        Self {
            rank,
            root: Scope::new(placement, ExecutionMode::Mirrored),
            stack: vec![],
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn current_scope(&self) -> &Scope {
        self.stack.last().unwrap_or(&self.root)
    }

    pub fn is_consistent(&self) -> bool {
        self.current_scope().mode() == ExecutionMode::Consistent
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Runs `f` with `scope` pushed, popping it again afterwards.
    pub fn with_scope<R>(&mut self, scope: Scope, f: impl FnOnce(&mut Session) -> R) -> R {
        log::trace!("enter {} scope", scope.mode());
        self.stack.push(scope);
        let result = f(self);
        self.stack.pop();
        result
    }

    /// Runs `f` in consistent mode over the current placement.
    pub fn with_consistent_scope<R>(&mut self, f: impl FnOnce(&mut Session) -> R) -> R {
        let placement = self.current_scope().placement().clone();
        self.with_scope(Scope::new(placement, ExecutionMode::Consistent), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceKind;

    #[test]
    fn test_scope_stack() {
        let placement = Placement::flat(DeviceKind::Cpu, vec![0, 1]).unwrap();
        let mut session = Session::new(1, placement.clone());
        assert!(!session.is_consistent());

        let depth = session.with_consistent_scope(|sess| {
            assert!(sess.is_consistent());
            assert_eq!(sess.current_scope().placement(), &placement);
            sess.with_scope(Scope::new(placement.clone(), ExecutionMode::Mirrored), |inner| {
                assert!(!inner.is_consistent());
                inner.depth()
            })
        });
        assert_eq!(depth, 2);
        assert_eq!(session.depth(), 0);
        assert!(!session.is_consistent());
    }
}
