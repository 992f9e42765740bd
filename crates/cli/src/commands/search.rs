use anyhow::{Context, Result, bail};
use tabula::{FilterCondition, Grid, SortKey};

use crate::render;

pub struct SearchArgs {
    pub term: String,
    pub case_sensitive: bool,
    pub exact: bool,
    pub steps: usize,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub group: Option<String>,
    pub page_size: Option<usize>,
}

pub fn run(grid: &mut Grid, args: &SearchArgs) -> Result<()> {
    if let Some(filter) = &args.filter {
        let (column, text) = filter
            .split_once('=')
            .context("--filter expects COLUMN=TEXT")?;
        grid.apply_filter(FilterCondition::contains(column, text));
    }
    if let Some(sort) = &args.sort {
        let key = match sort.strip_prefix('-') {
            Some(column) => SortKey::descending(column),
            None => SortKey::ascending(sort.as_str()),
        };
        grid.sort(key);
    }
    if let Some(group) = &args.group {
        grid.group_by(group);
    }
    if let Some(size) = args.page_size {
        if size == 0 {
            bail!("--page-size must be positive");
        }
        grid.set_page_size(Some(size));
    }

    let mut count = 0;
    for _ in 0..args.steps.max(1) {
        count = grid.find_next(&args.term, args.case_sensitive, args.exact);
    }

    print!("{}", render::render_grid(grid));
    if grid.page_count() > 1 {
        println!("Page {} of {}", grid.page_index() + 1, grid.page_count());
    }
    match grid.search_position() {
        Some((n, m)) => println!("Match {n} of {m}"),
        None if count == 0 => println!("No matches for {:?}", args.term),
        None => {}
    }
    Ok(())
}
