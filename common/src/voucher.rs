/// Result of feeding one keypress into the entry buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    /// Key accepted (or ignored); keep collecting.
    Pending,
    /// `#` pressed with a complete code; the buffer is handed out and reset.
    Submit(String),
    /// `*` pressed; buffer discarded.
    Cleared,
    /// `#` pressed with an incomplete code; buffer discarded.
    Rejected,
}

/// Accumulates keypad characters into a voucher code.
///
/// The keypad yields `0`-`9` and `A`-`D`; `#` submits, `*` clears. Extra
/// digits beyond the code length are dropped rather than shifting the buffer.
#[derive(Debug, Clone)]
pub struct VoucherEntry {
    buffer: String,
    length: usize,
}

impl VoucherEntry {
    pub fn new(length: usize) -> Self {
        Self {
            buffer: String::with_capacity(length),
            length,
        }
    }

    pub fn partial(&self) -> &str {
        &self.buffer
    }

    pub fn push_key(&mut self, key: char) -> KeyEvent {
        let key = key.to_ascii_uppercase();
        match key {
            '#' => {
                if self.buffer.len() == self.length {
                    KeyEvent::Submit(std::mem::take(&mut self.buffer))
                } else {
                    self.buffer.clear();
                    KeyEvent::Rejected
                }
            }
            '*' => {
                self.buffer.clear();
                KeyEvent::Cleared
            }
            '0'..='9' | 'A'..='D' => {
                if self.buffer.len() < self.length {
                    self.buffer.push(key);
                }
                KeyEvent::Pending
            }
            _ => KeyEvent::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feed(entry: &mut VoucherEntry, keys: &str) -> KeyEvent {
        let mut last = KeyEvent::Pending;
        for key in keys.chars() {
            last = entry.push_key(key);
        }
        last
    }

    #[test]
    fn full_code_submits_on_hash() {
        let mut entry = VoucherEntry::new(6);

        assert_eq!(
            feed(&mut entry, "12A45B#"),
            KeyEvent::Submit("12A45B".to_string())
        );
        assert_eq!(entry.partial(), "");
    }

    #[test]
    fn short_code_is_rejected_and_cleared() {
        let mut entry = VoucherEntry::new(6);

        assert_eq!(feed(&mut entry, "123#"), KeyEvent::Rejected);
        assert_eq!(entry.partial(), "");
    }

    #[test]
    fn star_clears_the_buffer() {
        let mut entry = VoucherEntry::new(6);

        feed(&mut entry, "987");
        assert_eq!(entry.push_key('*'), KeyEvent::Cleared);
        assert_eq!(entry.partial(), "");
    }

    #[test]
    fn extra_digits_are_dropped() {
        let mut entry = VoucherEntry::new(6);

        assert_eq!(
            feed(&mut entry, "11223344#"),
            KeyEvent::Submit("112233".to_string())
        );
    }

    #[test]
    fn lowercase_letters_are_normalized() {
        let mut entry = VoucherEntry::new(6);

        assert_eq!(
            feed(&mut entry, "abcd12#"),
            KeyEvent::Submit("ABCD12".to_string())
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut entry = VoucherEntry::new(6);

        feed(&mut entry, "1 2-3E4Z56");
        assert_eq!(entry.partial(), "123456");
    }
}
