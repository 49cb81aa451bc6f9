//! Specula demo: a bounded stack specification, run through the CLI.
//!
//! `cargo run -- -v` prints the scenario tree, `cargo run -- --list` lists it without running anything.

use thiserror::Error;

/// A stack that holds at most `capacity` items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack<T> {
    items: Vec<T>,
    capacity: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackError {
    #[error("stack is full (capacity {capacity})")]
    Full { capacity: usize },
}

impl<T> Stack<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) -> Result<(), StackError> {
        if self.is_full() {
            return Err(StackError::Full {
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }
}

#[specula::specification]
mod stack_spec {
    use specula::prelude::*;

    use super::{Stack, StackError};

    #[derive(Default)]
    pub struct StackSpec {
        stack: SubjectSlot<Stack<String>>,
    }

    impl Specification for StackSpec {
        fn bind_context_object(&mut self, object: &ContextObject) {
            self.stack.bind(object);
        }
    }

    pub struct EmptyStack {
        stack: SubjectSlot<Stack<String>>,
    }

    impl EmptyStack {
        pub fn new(spec: &mut StackSpec) -> Self {
            Self {
                stack: spec.stack.clone(),
            }
        }

        pub fn context(&mut self) -> Stack<String> {
            Stack::with_capacity(3)
        }

        pub fn is_empty(&mut self) {
            self.stack
                .with(|stack| specify_that(stack.is_empty(), "a new stack should be empty"));
        }

        pub fn has_nothing_to_peek(&self) {
            self.stack.with(|stack| specify(&stack.peek(), should::equal(None)));
        }

        pub fn pops_nothing(&mut self) {
            self.stack.with(|stack| specify(&stack.pop(), should::equal(None)));
        }

        pub fn accepts_a_push(&mut self) -> Result<(), StackError> {
            self.stack.with(|stack| stack.push("one".to_string()))?;
            self.stack.with(|stack| specify(&stack.len(), should::equal(1)));
            Ok(())
        }
    }

    pub struct FullStack {
        stack: SubjectSlot<Stack<String>>,
    }

    impl FullStack {
        pub fn new(spec: &mut StackSpec) -> Self {
            Self {
                stack: spec.stack.clone(),
            }
        }

        pub fn context(&mut self) -> Result<Stack<String>, StackError> {
            let mut stack = Stack::with_capacity(2);
            stack.push("first".to_string())?;
            stack.push("second".to_string())?;
            Ok(stack)
        }

        pub fn is_full(&self) {
            self.stack.with(|stack| specify_that(stack.is_full(), "two items should fill the stack"));
        }

        pub fn rejects_another_push(&mut self) {
            self.stack.with(|stack| {
                specify(
                    &stack.push("third".to_string()),
                    should::equal(Err(StackError::Full { capacity: 2 })),
                )
            });
        }

        pub fn pops_the_last_pushed_item(&mut self) {
            self.stack
                .with(|stack| specify(&stack.pop().as_deref(), should::equal(Some("second"))));
        }
    }

    mod after_popping {
        use specula::prelude::*;

        use super::StackSpec;
        use crate::Stack;

        pub struct OneOfTwo {
            stack: SubjectSlot<Stack<String>>,
        }

        impl OneOfTwo {
            pub fn new(spec: &mut StackSpec) -> Self {
                Self {
                    stack: spec.stack.clone(),
                }
            }

            #[subject]
            pub fn popped_once(&mut self) -> Stack<String> {
                let mut stack = Stack::with_capacity(2);
                stack.items = vec!["first".to_string(), "second".to_string()];
                stack.pop();
                stack
            }

            pub fn holds_1_item(&self) {
                self.stack.with(|stack| specify(&stack.len(), should::equal(1)));
            }

            pub fn is_no_longer_full(&self) {
                self.stack.with(|stack| specify_that(!stack.is_full(), "the stack should have room"));
            }

            #[disposer]
            pub fn release(&mut self) {
                self.stack.clear();
            }
        }
    }

    /// Unbounded stacks are not implemented yet.
    #[ignore]
    pub struct UnboundedStack {
        stack: SubjectSlot<Stack<String>>,
    }

    impl UnboundedStack {
        pub fn new(spec: &mut StackSpec) -> Self {
            Self {
                stack: spec.stack.clone(),
            }
        }

        pub fn context(&mut self) -> Stack<String> {
            Stack::with_capacity(1024)
        }

        pub fn is_never_full(&self) {
            self.stack.with(|stack| specify_that(!stack.is_full(), "unbounded"));
        }
    }
}

fn main() {
    specula::cli::run(&[stack_spec::specification()]);
}
