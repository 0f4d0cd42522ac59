use std::io::{stdout, Write};
use std::process;

use belief_revision::belief_base::BeliefBase;
use belief_revision::contraction::PartialMeetContraction;
use belief_revision::entailment::EntailmentChecker;
use belief_revision::propositional_logic::{parse_formula, Formula};
use belief_revision::revision::{Expansion, Revision};
use belief_revision::utils::run_repeatedly_and_average;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn parse_or_exit(input: &str) -> Formula {
    match parse_formula(input) {
        Ok(formula) => formula,
        Err(err) => {
            eprintln!("Could not parse {input:?}: {err}");
            process::exit(1);
        }
    }
}

fn main() -> std::io::Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let mut stdout = stdout();
    let checker = EntailmentChecker::new();
    let contraction = PartialMeetContraction::with_checker(checker);
    let expansion = Expansion::with_checker(checker);
    let revision = Revision::with_checker(checker);

    let p = parse_or_exit("p");
    let q = parse_or_exit("q");
    let r = parse_or_exit("r");
    let not_p = parse_or_exit("~p");

    println!("\nExample 1: A belief base");

    let mut base = BeliefBase::new();
    base.add(parse_or_exit("p -> q"), 3);
    base.add(p.clone(), 2);
    base.add(parse_or_exit("q -> r"), 2);
    println!("{base}");
    let conjunction = base.conjunction();
    conjunction.pprint(&mut stdout)?;
    conjunction.print_truthtable(&mut stdout)?;
    println!("Is consistent?: {}", base.is_consistent(&checker));

    println!("\nExample 2: Entailment");

    r.pprint(&mut stdout)?;
    println!("Entailed?: {}", checker.entails(&conjunction, &r));
    let cnf = Formula::and(&conjunction, &Formula::not(&r)).to_cnf();
    match cnf {
        Ok(cnf) => {
            println!("Refuted through the clauses of...");
            cnf.pprint(&mut stdout)?;
        }
        Err(err) => println!("No CNF: {err}"),
    }

    println!("\nExample 3: Contraction by p");

    let contracted = contraction.contract(&base, &p);
    println!("{contracted}");
    println!(
        "Still entails p?: {}",
        checker.entails(&contracted.conjunction(), &p)
    );
    println!(
        "Still entails r?: {}",
        checker.entails(&contracted.conjunction(), &r)
    );

    println!("\nExample 4: Expansion by q (priority 1)");

    let expanded = expansion.expand(&contracted, &q, 1);
    println!("{expanded}");
    println!(
        "Entails r?: {}",
        checker.entails(&expanded.conjunction(), &r)
    );

    println!("\nExample 5: Revision by ~p (priority 3)");

    let revised = revision.revise(&base, &not_p, 3);
    println!("{revised}");
    println!(
        "Entails ~p?: {}",
        checker.entails(&revised.conjunction(), &not_p)
    );
    println!("Is consistent?: {}", revised.is_consistent(&checker));

    println!("\nExample 6: Iterated revision by ~q then r");

    let formulas = [parse_or_exit("~q"), r.clone()];
    let iterated = revision.iterative_revision(&base, &formulas, Some(&[4, 1][..]));
    println!("{iterated}");

    println!("\nExample 7: Timing a revision");

    run_repeatedly_and_average(
        || {
            revision.revise(&base, &not_p, 3);
        },
        10,
    );
    stdout.flush()
}
