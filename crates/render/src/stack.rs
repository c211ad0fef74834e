use glam::{Mat4, Vec3};

/// Errors from transform stack misuse.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StackError {
    #[error("transform stack overflow (capacity {0})")]
    Overflow(usize),
    #[error("pop from an empty transform stack")]
    Underflow,
    #[error("transform stack unbalanced: depth {before} before, {after} after")]
    Unbalanced { before: usize, after: usize },
}

/// One local transform step applied to the current matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalOp {
    Scale(Vec3),
    Translate(Vec3),
    Rotate { deg: f32, axis: Vec3 },
}

impl LocalOp {
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Scale(s) => Mat4::from_scale(s),
            Self::Translate(t) => Mat4::from_translation(t),
            Self::Rotate { deg, axis } => Mat4::from_axis_angle(axis.normalize(), deg.to_radians()),
        }
    }
}

/// Hierarchical model transform with a bounded save stack.
///
/// All transform calls post-multiply the current matrix, so the op applied
/// last acts first on the geometry.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Mat4,
    saved: Vec<Mat4>,
    capacity: usize,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new(16)
    }
}

impl TransformStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            current: Mat4::IDENTITY,
            saved: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// The accumulated model matrix.
    pub fn current(&self) -> Mat4 {
        self.current
    }

    /// Replace the current matrix without touching saved entries.
    pub fn set(&mut self, m: Mat4) {
        self.current = m;
    }

    /// Number of saved matrices.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Save a copy of the current matrix.
    pub fn push(&mut self) -> Result<(), StackError> {
        if self.saved.len() >= self.capacity {
            return Err(StackError::Overflow(self.capacity));
        }
        self.saved.push(self.current);
        Ok(())
    }

    /// Restore the most recently saved matrix.
    pub fn pop(&mut self) -> Result<(), StackError> {
        self.current = self.saved.pop().ok_or(StackError::Underflow)?;
        Ok(())
    }

    /// Run `f` between a push and its matching pop.
    ///
    /// Fails with `Unbalanced` if `f` leaves the stack at a different depth.
    /// Extra entries left by `f` are discarded and the matrix saved on entry
    /// is restored before the error is returned.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> Result<R, StackError> {
        self.push()?;
        let depth = self.depth();
        let out = f(self);
        let after = self.depth();
        if after != depth {
            if after > depth {
                self.saved.truncate(depth);
                self.pop()?;
            }
            return Err(StackError::Unbalanced {
                before: depth,
                after,
            });
        }
        self.pop()?;
        Ok(out)
    }

    pub fn multiply(&mut self, m: Mat4) -> &mut Self {
        self.current *= m;
        self
    }

    /// Post-multiply a translation.
    pub fn translate(&mut self, t: Vec3) -> &mut Self {
        self.multiply(Mat4::from_translation(t))
    }

    /// Post-multiply a non-uniform scale.
    pub fn scale(&mut self, s: Vec3) -> &mut Self {
        self.multiply(Mat4::from_scale(s))
    }

    /// Post-multiply a rotation of `deg` degrees about `axis`.
    pub fn rotate_deg(&mut self, deg: f32, axis: Vec3) -> &mut Self {
        self.multiply(LocalOp::Rotate { deg, axis }.matrix())
    }

    pub fn apply(&mut self, op: &LocalOp) -> &mut Self {
        self.multiply(op.matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_restores() {
        let mut stack = TransformStack::default();
        stack.translate(Vec3::new(1.0, 0.0, 0.0));
        let saved = stack.current();
        stack.push().unwrap();
        stack.scale(Vec3::splat(2.0));
        assert_ne!(stack.current(), saved);
        stack.pop().unwrap();
        assert_eq!(stack.current(), saved);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn pop_empty_is_underflow() {
        let mut stack = TransformStack::default();
        assert_eq!(stack.pop(), Err(StackError::Underflow));
    }

    #[test]
    fn push_past_capacity_is_overflow() {
        let mut stack = TransformStack::new(2);
        stack.push().unwrap();
        stack.push().unwrap();
        assert_eq!(stack.push(), Err(StackError::Overflow(2)));
    }

    #[test]
    fn scoped_is_balanced() {
        let mut stack = TransformStack::default();
        let before = stack.current();
        for _ in 0..20 {
            stack
                .scoped(|s| {
                    s.translate(Vec3::X).rotate_deg(30.0, Vec3::Y);
                    assert_eq!(s.depth(), 1);
                })
                .unwrap();
        }
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), before);
    }

    #[test]
    fn nested_scopes_unwind() {
        let mut stack = TransformStack::default();
        stack
            .scoped(|outer| {
                outer.translate(Vec3::Z);
                outer
                    .scoped(|inner| {
                        inner.scale(Vec3::splat(3.0));
                        assert_eq!(inner.depth(), 2);
                    })
                    .unwrap();
                assert_eq!(outer.depth(), 1);
            })
            .unwrap();
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn scoped_detects_leaked_push() {
        let mut stack = TransformStack::default();
        stack.translate(Vec3::Y);
        let before = stack.current();
        let err = stack
            .scoped(|s| {
                s.scale(Vec3::splat(4.0));
                s.push().unwrap();
                s.push().unwrap();
            })
            .unwrap_err();
        assert_eq!(err, StackError::Unbalanced { before: 1, after: 3 });
        // The failed scope still unwinds to where it started.
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), before);
    }

    #[test]
    fn ops_post_multiply() {
        let mut stack = TransformStack::default();
        stack.scale(Vec3::splat(2.0)).translate(Vec3::new(1.0, 0.0, 0.0));
        // Translate acts first, then scale.
        let p = stack.current().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }
}
