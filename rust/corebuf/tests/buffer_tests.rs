use std::fmt::Write;

use corebuf::{
    AnsiString, ArenaAllocator, ArenaConfig, Array, Buffer, BufferState, default_allocator,
    with_formatted,
};

#[test]
fn test_remove_keeps_capacity() {
    let mut a = Array::<u32>::new(default_allocator());
    for i in 0..7 {
        a.push(i).unwrap();
    }
    assert_eq!(a.remove(2, 2), 2);
    assert_eq!(a.as_slice(), &[0, 1, 4, 5, 6]);
    assert_eq!(a.capacity(), 8);
    assert_eq!(a.state(), BufferState::Ready);
}

#[test]
fn test_arena_backed_buffer() {
    let arena = unsafe { ArenaAllocator::new(ArenaConfig::with_capacity(64)) }.unwrap();
    let mut a = Buffer::<u32>::new(&arena);
    for i in 0..16 {
        a.push(i).unwrap();
    }
    assert_eq!(a.data() as *const u8, arena.as_ptr());
    assert_eq!(a.capacity(), 16);

    // The arena cannot hold more than 64 bytes.
    let err = a.push(16).unwrap_err();
    assert!(err.is_allocation_failure());
    assert_eq!(a.count(), 16);
    assert_eq!(a.last(), Some(&15));

    a.clear(13, 0);
    a.fit().unwrap();
    assert_eq!(a.capacity(), 4);
    assert_eq!(a.as_slice(), &[0, 1, 2]);
    assert_eq!(a.data() as *const u8, arena.as_ptr());

    a.release();
    assert!(a.validate());
}

#[test]
fn test_arena_rejects_overaligned_elements() {
    #[derive(Clone, Copy)]
    #[repr(C, align(32))]
    struct Wide([u8; 32]);

    unsafe impl bytemuck::Zeroable for Wide {}
    unsafe impl bytemuck::Pod for Wide {}

    let arena = unsafe { ArenaAllocator::new(ArenaConfig::default()) }.unwrap();
    let mut a = Buffer::<Wide>::new(&arena);
    assert!(a.push(Wide([1; 32])).is_err());
    assert!(a.is_empty());

    let mut b = Buffer::<Wide>::new(default_allocator());
    b.push(Wide([1; 32])).unwrap();
    assert_eq!(b.state(), BufferState::Ready);
    assert_eq!(b.data() as usize % 32, 0);
}

#[test]
fn test_buffers_move_between_allocators() {
    let arena = unsafe { ArenaAllocator::new(ArenaConfig::default()) }.unwrap();
    let mut scratch = Buffer::<u8>::new(&arena);
    scratch.extend_from_slice(b"Lore Ipsum est").unwrap();

    let mut kept = Buffer::<u8>::new(default_allocator());
    assert_eq!(kept.extract(&mut scratch, 0, 4).unwrap(), 4);
    assert_eq!(kept.as_slice(), b"Lore");
    assert_eq!(scratch.as_slice(), b" Ipsum est");

    scratch.copy_from_slice(&kept).unwrap();
    assert_eq!(kept, scratch);
    assert_eq!(scratch.data() as *const u8, arena.as_ptr());
}

#[test]
fn test_search_and_splice() {
    let text = "the quick brown fox jumps over the lazy dog";
    let mut a = Buffer::from_slice(default_allocator(), text.as_bytes()).unwrap();

    let first = a.find_first(b"the", 0).unwrap();
    let last = a.find_last(b"the", usize::MAX).unwrap();
    assert_eq!((first, last), (0, 31));

    a.remove(last, 4);
    a.insert(last, b"a ", 0, 2).unwrap();
    assert_eq!(std::str::from_utf8(&a).unwrap(), "the quick brown fox jumps over a lazy dog");
    assert_eq!(a.find_first(b"the", 1), None);
}

#[test]
fn test_string_over_arena() {
    let arena = unsafe { ArenaAllocator::new(ArenaConfig::with_capacity(32)) }.unwrap();
    let mut s = AnsiString::from_str_in(&arena, "Lore").unwrap();
    write!(s, " {}", "Ipsum").unwrap();
    assert_eq!(s, "Lore Ipsum");
    assert_eq!(s.as_bytes_with_nul(), b"Lore Ipsum\0");
    assert_eq!(s.capacity(), 16);

    assert!(s.push_str(" dolor sit amet, consectetur").is_err());
    assert_eq!(s, "Lore Ipsum");
}

#[test]
fn test_with_formatted_on_many_threads() {
    let handles: Vec<_> = (0..4)
        .map(|t| {
            std::thread::spawn(move || {
                for i in 0..100 {
                    let expected = format!("thread {t} iteration {i}");
                    let same = with_formatted(format_args!("thread {t} iteration {i}"), |s| {
                        s.to_str() == Ok(expected.as_str())
                    })
                    .unwrap();
                    assert!(same);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
