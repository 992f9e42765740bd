use tabula::Grid;

pub fn run(grid: &mut Grid, term: &str, case_sensitive: bool, exact: bool) {
    let count = grid.find_next(term, case_sensitive, exact);
    if count == 0 {
        println!("No matches for {term:?}");
        return;
    }

    for record in grid.match_records() {
        println!(
            "row {} · {} [{}..{}] in {:?}",
            record.row_key,
            record.column_id,
            record.start,
            record.start + record.len,
            record.cell_text
        );
    }
    println!("{count} match(es)");
}
