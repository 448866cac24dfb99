fn main() {
  if let Err(e) = diet_tracker_lib::run() {
    eprintln!("Error: {}", e);
    std::process::exit(1);
  }
}
