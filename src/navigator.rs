/// Current question index, always within `[0, count - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionNavigator {
    current: usize,
    count: usize,
}

impl QuestionNavigator {
    pub fn new(count: usize) -> Self {
        Self { current: 0, count }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// No wrap-around; stays on the last question.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.count {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn jump_to(&mut self, index: usize) {
        self.current = index.min(self.count.saturating_sub(1));
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.count
    }

    /// One-based "3 of 10" position for display.
    pub fn position(&self) -> (usize, usize) {
        (self.current + 1, self.count)
    }
}
