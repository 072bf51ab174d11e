use std::ptr;

use treealloc::{HEADER_SIZE, TreeAllocator};

/// Prints a chunk and its descendants, one level of indentation per depth.
unsafe fn print_tree(
  tree: &TreeAllocator,
  chunk: *mut u8,
  depth: usize,
) {
  println!("{:indent$}{:?}", "", chunk, indent = depth * 2);

  unsafe {
    for child in tree.children(chunk) {
      print_tree(tree, child, depth + 1);
    }
  }
}

fn main() {
  let tree = TreeAllocator::new();

  println!("Each chunk carries {HEADER_SIZE} bytes of header.");

  unsafe {
    // --------------------------------------------------------------------
    // 1) A document owning two nodes, one of which owns a string.
    // --------------------------------------------------------------------
    let doc = tree.alloc(64, ptr::null_mut());
    let first = tree.alloc(32, doc);
    let second = tree.alloc(32, doc);
    let text = tree.alloc_zeroed(16, first);

    println!("\n[1] Initial tree");
    print_tree(&tree, doc, 0);

    // --------------------------------------------------------------------
    // 2) Grow the first node. It may move; its neighbours follow it.
    // --------------------------------------------------------------------
    let first = tree.reallocate(first, 1 << 20);
    println!("\n[2] After growing {first:?} to 1 MiB");
    print_tree(&tree, doc, 0);
    println!("[2] parent of text = {:?}", tree.get_parent(text));

    // --------------------------------------------------------------------
    // 3) Hand the string to the second node and detach the first.
    // --------------------------------------------------------------------
    tree.steal(first, second);
    println!("\n[3] After stealing {first:?}'s children into {second:?}");
    print_tree(&tree, doc, 0);
    print_tree(&tree, first, 0);

    // --------------------------------------------------------------------
    // 4) One call releases the document and everything it still owns.
    // --------------------------------------------------------------------
    tree.free(first);
    tree.free(doc);
    println!("\n[4] Freed everything.");
  }
}
