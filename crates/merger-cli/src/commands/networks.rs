// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Networks Command
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use anyhow::Result;
use clap::Args;
use merger_core::composition::CompositionTable;

#[derive(Args)]
pub struct NetworksArgs {
    /// Also list each network's isotopes
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn execute(args: NetworksArgs) -> Result<()> {
    for name in CompositionTable::builtin_names() {
        let table = CompositionTable::builtin(name)?;
        println!("{name:<20} {:>3} isotopes", table.n_isotopes());
        if args.verbose {
            let isotopes: Vec<&str> = table.isotopes().iter().map(|i| i.name.as_str()).collect();
            println!("    {}", isotopes.join(" "));
        }
    }
    Ok(())
}
