//! Copy-on-write helpers over ordered sequences.
//!
//! Every helper returns a fresh `Vec`; an index outside the sequence is a
//! caller bug and panics instead of corrupting the result.

pub fn appended<T: Clone>(items: &[T], item: T) -> Vec<T> {
    let mut next = Vec::with_capacity(items.len() + 1);
    next.extend_from_slice(items);
    next.push(item);
    next
}

pub fn replace_at<T: Clone>(items: &[T], index: usize, item: T) -> Vec<T> {
    check(items.len(), index);
    let mut next = items.to_vec();
    next[index] = item;
    next
}

pub fn remove_at<T: Clone>(items: &[T], index: usize) -> Vec<T> {
    check(items.len(), index);
    let mut next = items.to_vec();
    next.remove(index);
    next
}

pub fn swapped<T: Clone>(items: &[T], a: usize, b: usize) -> Vec<T> {
    check(items.len(), a);
    check(items.len(), b);
    let mut next = items.to_vec();
    next.swap(a, b);
    next
}

fn check(len: usize, index: usize) {
    assert!(
        index < len,
        "index {index} is out of range for a sequence of length {len}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_do_not_touch_the_source() {
        let source = vec![1, 2, 3];
        assert_eq!(replace_at(&source, 1, 9), vec![1, 9, 3]);
        assert_eq!(remove_at(&source, 0), vec![2, 3]);
        assert_eq!(swapped(&source, 0, 2), vec![3, 2, 1]);
        assert_eq!(appended(&source, 4), vec![1, 2, 3, 4]);
        assert_eq!(source, vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_panics() {
        let _ = remove_at(&[1, 2], 2);
    }
}
