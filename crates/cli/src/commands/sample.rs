use crate::dataset;

pub fn run() {
    println!("{}", dataset::SAMPLE);
}
