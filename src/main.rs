use anyhow::Result;

fn main() -> Result<()> {
    aquarium::app::run()
}
