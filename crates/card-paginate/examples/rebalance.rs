use card_paginate::*;

fn numbered_rows(prefix: &str, count: usize) -> RowSource {
    let mut text = String::from("@name\n");
    for i in 1..=count {
        text.push_str(&format!("{} {}\n", prefix, i));
    }
    RowSource::parse(&text, format!("{}.csv", prefix)).expect("generated CSV is valid")
}

fn main() {
    let mut registry = TemplateRegistry::new();
    let heroes = registry
        .register(ComponentTemplate::new_merge("heroes"))
        .expect("unique name");
    let villains = registry
        .register(ComponentTemplate::new_merge("villains"))
        .expect("unique name");
    let back = registry
        .register(ComponentTemplate::new_static("back", 12))
        .expect("unique name");

    let mut merge = MergeManager::new();
    merge.insert(heroes, numbered_rows("Hero", 12));
    merge.insert(villains, numbered_rows("Villain", 20));

    // Top row and a half: heroes, then villains, bottom row: card backs
    let mut grid = GridTemplate::new(3, 3);
    let owners = [heroes, heroes, heroes, heroes, villains, villains, back, back, back];
    for (idx, owner) in owners.into_iter().enumerate() {
        grid.assign(idx / 3, idx % 3, Some(owner));
    }

    let mut allocator =
        PageAllocator::with_default_factory(&grid, &registry, merge).expect("something to place");

    for page in allocator.iter_pages() {
        println!("Page {}:", page.index + 1);
        for row in page.placements.chunks(grid.columns()) {
            let cells: Vec<String> = row
                .iter()
                .map(|p| match &p.instance {
                    Some(instance) => match &instance.row {
                        Some(fields) => fields["@name"].clone(),
                        None => instance.name.clone(),
                    },
                    None => "-".to_string(),
                })
                .map(|label| format!("{:<12}", label))
                .collect();
            println!("  {}", cells.join(""));
        }
    }

    let stats = calculate_statistics(&mut allocator);
    println!(
        "{} pages, {} of {} slots filled",
        stats.pages,
        stats.filled_slots,
        stats.filled_slots + stats.empty_slots
    );
}
