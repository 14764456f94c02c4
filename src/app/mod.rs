//! The interactive application: one scanner, one characterizer, one
//! registry, and a shell that drives them.
//!
//! The shell reads commands from stdin (`$ ` prompt) and blocks on the
//! scanner while a definition window is open; the characterizer pauses the
//! scanner when the window closes, which returns control to the shell.

mod command;

pub use self::command::{Command, CommandKind};

use crate::scanner::ScanCode;
use crate::{anomaly, AnomalyReport, CharacterizedObject, Characterizer, Error, Registry, Result, Scanner};
use log::{debug, warn};
use std::io::{self, BufRead, Write};
use std::time::Instant;

/// The application state behind the interactive shell.
#[derive(Debug)]
pub struct App {
    scanner: Scanner,
    characterizer: Characterizer,
    registry: Registry,
    chrono_analyze: bool,
}

impl App {
    /// Creates an application around a scanner.
    pub fn new(scanner: Scanner) -> App {
        App {
            scanner,
            characterizer: Characterizer::new(),
            registry: Registry::new(),
            chrono_analyze: false,
        }
    }

    /// Returns the characterizer, for configuration.
    pub fn characterizer_mut(&mut self) -> &mut Characterizer {
        &mut self.characterizer
    }

    /// Enables the definition and/or analysis chronometers.
    pub fn set_chrono(&mut self, define: bool, analyze: bool) {
        self.characterizer.set_chrono(define);
        self.chrono_analyze = analyze;
    }

    /// Acquires the scanner's source.
    pub fn init(&mut self) -> Result<()> {
        self.scanner.init()
    }

    /// Releases the scanner's source.
    pub fn close(&mut self) {
        self.scanner.stop();
    }

    /// Runs the shell over stdin until `exit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        self.run_from(stdin.lock())
    }

    /// Runs the shell over any line source.
    pub fn run_from<R: BufRead>(&mut self, input: R) -> Result<()> {
        prompt()?;
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                prompt()?;
                continue;
            }
            debug!("read command: {line}");
            if !self.dispatch(&Command::parse(&line)) {
                return Ok(());
            }
            prompt()?;
        }
        Ok(())
    }

    /// Executes one command. Returns false when the shell should exit.
    pub fn dispatch(&mut self, command: &Command) -> bool {
        match command.kind() {
            CommandKind::Help => {
                print_help(command.arg(0).map(|arg| Command::parse(arg).kind()));
            }
            CommandKind::Exit => return false,
            CommandKind::Chrono => self.chrono(command),
            CommandKind::Define => self.define(command),
            CommandKind::Set => self.set(command),
            CommandKind::Discard => self.discard(command),
            CommandKind::Object => self.object(command),
            CommandKind::Model => self.model(command),
            CommandKind::Info => self.info(),
            CommandKind::List => self.list(command),
            CommandKind::Analyze => self.analyze(command),
            CommandKind::Unknown => unknown_command(None),
        }
        true
    }

    /// Blocks on the scanner until the characterizer closes its window.
    fn drive_scan(&mut self) {
        let App {
            scanner,
            characterizer,
            ..
        } = self;
        match scanner.scan(&mut |point| characterizer.feed(&point)) {
            Ok(ScanCode::Paused) => {}
            Ok(ScanCode::Eof) => {
                warn!("stream ended before the window closed");
                characterizer.flush();
            }
            Err(e) => {
                eprintln!("scan failed: {e}");
                characterizer.flush();
            }
        }
    }

    fn define(&mut self, command: &Command) {
        match command.arg(0) {
            Some("background") => {
                self.characterizer.begin_background();
                self.drive_scan();
                println!(
                    "Defined background contains {} unique points",
                    self.characterizer.background_len()
                );
            }
            Some("object") => {
                let name = command.arg(1).map(str::to_string);
                self.characterizer.begin_object();
                self.drive_scan();
                let points = self.characterizer.take_object();
                println!(
                    "Defined object contains {} unique points ({} total points scanned)",
                    points.len(),
                    self.characterizer.seen()
                );
                let started = Instant::now();
                match CharacterizedObject::characterize(points) {
                    Ok(object) => {
                        if self.characterizer.chrono() {
                            println!(
                                "Object characterization lasted {:.6} s",
                                started.elapsed().as_secs_f64()
                            );
                        }
                        match self.registry.add_object(name, object) {
                            Ok(name) => println!("Object {name} created"),
                            Err(e) => eprintln!("Could not create object: {e}"),
                        }
                    }
                    Err(Error::InsufficientPoints) => {
                        eprintln!("Scanned object points are too sparse to correctly define an object")
                    }
                    Err(e) => eprintln!("Could not characterize object: {e}"),
                }
            }
            _ => unknown_command(Some("define")),
        }
    }

    fn discard(&mut self, command: &Command) {
        let Some(millis) = command.arg(0).and_then(|arg| arg.parse::<u32>().ok()) else {
            eprintln!("Invalid time");
            return;
        };
        self.characterizer.begin_discard(millis);
        self.drive_scan();
        println!(
            "A total of {} points were discarded during {} ms",
            self.characterizer.seen(),
            millis
        );
    }

    fn set(&mut self, command: &Command) {
        let (Some(param), Some(value)) = (command.arg(0), command.arg(1)) else {
            unknown_command(Some("set"));
            return;
        };
        match param {
            "backframe" => match value.parse() {
                Ok(millis) => {
                    self.characterizer.set_back_frame(millis);
                    println!("New background frame set at {millis} ms");
                }
                Err(_) => eprintln!("Invalid number"),
            },
            "objframe" => match value.parse() {
                Ok(millis) => {
                    self.characterizer.set_obj_frame(millis);
                    println!("New object frame set at {millis} ms");
                }
                Err(_) => eprintln!("Invalid number"),
            },
            "backthreshold" => match value.parse() {
                Ok(distance) => {
                    self.characterizer.set_back_distance(distance);
                    println!("New background distance threshold set at {distance} m");
                }
                Err(_) => eprintln!("Invalid number"),
            },
            "reflthreshold" => match value.parse() {
                Ok(reflectivity) => {
                    self.characterizer.set_min_reflectivity(reflectivity);
                    println!("New minimum reflectivity set at {reflectivity} points");
                }
                Err(_) => eprintln!("Invalid number"),
            },
            _ => unknown_command(Some("set")),
        }
    }

    fn chrono(&mut self, command: &Command) {
        let enable = match command.arg(0) {
            Some("set") => true,
            Some("unset") => false,
            _ => {
                unknown_command(Some("chrono"));
                return;
            }
        };
        let word = if enable { "Set" } else { "Unset" };
        match command.arg(1) {
            Some("define") => {
                self.characterizer.set_chrono(enable);
                println!("{word} define chronometer");
            }
            Some("analyze") => {
                self.chrono_analyze = enable;
                println!("{word} analyze chronometer");
            }
            Some("all") => {
                self.characterizer.set_chrono(enable);
                self.chrono_analyze = enable;
                println!("{word} all chronometers");
            }
            _ => unknown_command(Some("chrono")),
        }
    }

    fn object(&mut self, command: &Command) {
        match (command.arg(0), command.arg(1), command.arg(2)) {
            (Some("describe"), Some(name), None) => match self.registry.object(name) {
                Some(object) => describe("Object", name, object),
                None => eprintln!("Could not locate object {name}"),
            },
            (Some("save"), Some(name), Some(file)) => {
                match self.registry.save_object(name, file) {
                    Ok(()) => println!("Object {name} written into file {file}"),
                    Err(e) => eprintln!("Could not save object {name}: {e}"),
                }
            }
            (Some("load"), Some(name), Some(file)) => {
                match self.registry.load_object(name, file) {
                    Ok(()) => println!("Object {name} loaded from file {file}"),
                    Err(e) => eprintln!("Could not load object {name}: {e}"),
                }
            }
            (Some("csv"), Some(name), Some(file)) => {
                match self.registry.export_object_csv(name, file) {
                    Ok(()) => println!("Object {name} written into csv file {file}"),
                    Err(e) => eprintln!("Could not save object {name}: {e}"),
                }
            }
            _ => unknown_command(Some("object")),
        }
    }

    fn model(&mut self, command: &Command) {
        match (command.arg(0), command.arg(1), command.arg(2)) {
            (Some("new"), Some(object), Some(model)) => {
                match self.registry.promote(object, model) {
                    Ok(()) => println!("Saved {object} as model {model}"),
                    Err(e) => eprintln!("Could not save {object} as model {model}: {e}"),
                }
            }
            (Some("describe"), Some(name), None) => match self.registry.model(name) {
                Some(model) => describe("Model", name, model),
                None => eprintln!("Could not locate model {name}"),
            },
            (Some("save"), Some(name), Some(file)) => {
                match self.registry.save_model(name, file) {
                    Ok(()) => println!("Model {name} written into file {file}"),
                    Err(e) => eprintln!("Could not save model {name}: {e}"),
                }
            }
            (Some("load"), Some(name), Some(file)) => {
                match self.registry.load_model(name, file) {
                    Ok(()) => println!("Model {name} loaded from file {file}"),
                    Err(e) => eprintln!("Could not load model {name}: {e}"),
                }
            }
            (Some("csv"), Some(name), Some(file)) => {
                match self.registry.export_model_csv(name, file) {
                    Ok(()) => println!("Model {name} written into csv file {file}"),
                    Err(e) => eprintln!("Could not save model {name}: {e}"),
                }
            }
            _ => unknown_command(Some("model")),
        }
    }

    fn list(&mut self, command: &Command) {
        match command.arg(0) {
            Some("objects") => {
                let mut any = false;
                for (name, _) in self.registry.objects() {
                    if !any {
                        println!("Defined objects list:");
                        any = true;
                    }
                    println!("  {name}");
                }
                if !any {
                    println!("No objects were created yet");
                }
            }
            Some("models") => {
                let mut any = false;
                for (name, _) in self.registry.models() {
                    if !any {
                        println!("Models list:");
                        any = true;
                    }
                    println!("  {name}");
                }
                if !any {
                    println!("No models were loaded yet");
                }
            }
            _ => unknown_command(Some("list")),
        }
    }

    fn analyze(&mut self, command: &Command) {
        let (Some(object_name), Some(model_name)) = (command.arg(0), command.arg(1)) else {
            unknown_command(Some("analyze"));
            return;
        };
        let Some(object) = self.registry.object(object_name) else {
            eprintln!("Could not locate object {object_name}");
            return;
        };
        let Some(model) = self.registry.model(model_name) else {
            eprintln!("Could not locate model {model_name}");
            return;
        };
        let started = Instant::now();
        let report = anomaly::compare(object, model);
        if self.chrono_analyze {
            println!(
                "Anomaly detection lasted {:.6} s",
                started.elapsed().as_secs_f64()
            );
        }
        print_report(object, model, &report);
    }

    fn info(&self) {
        println!(
            "Object frame:            {} ms",
            self.characterizer.obj_frame()
        );
        println!(
            "Background frame:        {} ms",
            self.characterizer.back_frame()
        );
        println!(
            "Background threshold:    {} m",
            self.characterizer.back_distance()
        );
        println!(
            "Reflectivity threshold:  {} points",
            self.characterizer.min_reflectivity()
        );
        println!(
            "define chronometer:      {}",
            if self.characterizer.chrono() {
                "Activated"
            } else {
                "Deactivated"
            }
        );
        println!(
            "analyze chronometer:     {}",
            if self.chrono_analyze {
                "Activated"
            } else {
                "Deactivated"
            }
        );
    }
}

fn prompt() -> Result<()> {
    print!("$ ");
    io::stdout().flush()?;
    Ok(())
}

fn unknown_command(context: Option<&str>) {
    let context = context.unwrap_or("[command]");
    eprintln!("Unknown command: execute <help {context}> to get info about valid commands");
}

fn describe(what: &str, name: &str, object: &CharacterizedObject) {
    let extents = object.bbox().extents();
    println!("{what} {name} characteristics:");
    println!("  Total faces:      {}", object.faces().len());
    println!("  Total points:     {}", object.total_points());
    println!("  Width  / z_delta: {:.2}", extents.z);
    println!("  Height / y_delta: {:.2}", extents.y);
    println!("  Depth  / x_delta: {:.2}", extents.x);
    println!("  Normal vectors:");
    for face in object.faces() {
        let normal = face.normal();
        println!("    [{:.2}, {:.2}, {:.2}]", normal.x, normal.y, normal.z);
    }
}

fn print_report(object: &CharacterizedObject, model: &CharacterizedObject, report: &AnomalyReport) {
    println!("------------------------ ANOMALY REPORT ------------------------");
    println!(" // NOTES //");
    println!(" Bounding box subtractions represent the difference between");
    println!(" a model bounding box and an object bounding box in millimeters");
    println!(" with the dimensions in the following format:");
    println!("   [depth, height, width]");
    println!(" Face comparisons are made between the two faces specified in");
    println!(" the following format:");
    println!("   [model_face, object_face]");

    println!();
    println!(" // GENERAL COMPARISON //");
    println!(" NumFaces(model)  = {}", model.faces().len());
    println!(" NumFaces(object) = {}", object.faces().len());
    println!(" NumFaces(model) - NumFaces(object) = {}", report.delta_faces);
    if report.delta_faces < 0 {
        println!(" Object has {} more faces", -report.delta_faces);
    } else if report.delta_faces > 0 {
        println!(" Model has {} more faces", report.delta_faces);
    } else {
        println!(" Model and object have the same number of faces");
    }
    println!();
    let extents = model.bbox().extents();
    println!(
        " BoundBox(model)  = [{:.0}mm, {:.0}mm, {:.0}mm]",
        extents.x, extents.y, extents.z
    );
    let extents = object.bbox().extents();
    println!(
        " BoundBox(object) = [{:.0}mm, {:.0}mm, {:.0}mm]",
        extents.x, extents.y, extents.z
    );
    let deltas = report.general.deltas;
    println!(
        " BoundBox(model) - BoundBox(object) = [{:.0}mm, {:.0}mm, {:.0}mm]",
        deltas.x, deltas.y, deltas.z
    );
    println!(
        " As a whole, model and object are {}",
        if report.general.similar { "similar" } else { "different" }
    );

    println!();
    println!(" // FACE COMPARISONS //");
    for comparison in &report.face_comparisons {
        println!(" [{}, {}]", comparison.model_face, comparison.object_face);
        let extents = model.faces()[comparison.model_face].bbox().extents();
        println!(
            " BoundBox(fmodel)  = [{:.0}mm, {:.0}mm, {:.0}mm]",
            extents.x, extents.y, extents.z
        );
        let extents = object.faces()[comparison.object_face].bbox().extents();
        println!(
            " BoundBox(fobject) = [{:.0}mm, {:.0}mm, {:.0}mm]",
            extents.x, extents.y, extents.z
        );
        println!(
            " BBox(fmodel) - BBox(fobject) = [{:.0}mm, {:.0}mm, {:.0}mm]",
            comparison.deltas.x, comparison.deltas.y, comparison.deltas.z
        );
        println!(
            " Both faces are {}",
            if comparison.similar { "similar" } else { "different" }
        );
        println!();
    }
    for unmatched in &report.unmatched_model_faces {
        println!(" Model face {unmatched} is unmatched");
    }
    for unmatched in &report.unmatched_object_faces {
        println!(" Object face {unmatched} is unmatched");
    }

    println!();
    println!(" // CONCLUSION //");
    println!(
        " The given model and object are {}",
        if report.similar { "similar" } else { "different" }
    );
    println!("----------------------------------------------------------------");
}

fn print_help(kind: Option<CommandKind>) {
    // an unrecognized topic gets the whole listing
    let all = matches!(kind, None | Some(CommandKind::Unknown));
    let wants = |k: CommandKind| all || kind == Some(k);
    if wants(CommandKind::Help) {
        println!("help [command]                 Prints the help text of a command or all of them if not specified");
    }
    if wants(CommandKind::Exit) {
        println!("exit                           Exits the program");
    }
    if wants(CommandKind::Chrono) {
        println!("chrono <set|unset> <...>       Activation/Deactivation of specific chronometers:");
        println!("  - define                        Object and background definition routine");
        println!("  - analyze                       Anomaly detection routine");
        println!("  - all                           All of the above");
    }
    if wants(CommandKind::Define) {
        println!("define <...>                   Definition and characterization of objects and background:");
        println!("  - background                    Defines the background");
        println!("  - object [name]                 Defines an object with a specified name or an automatically generated one");
    }
    if wants(CommandKind::Set) {
        println!("set <...>                      Modification of current execution parameters:");
        println!("  - backframe <millisecs>         Milliseconds (integer) to scan for background points");
        println!("  - objframe <millisecs>          Milliseconds (integer) to scan for object points");
        println!("  - backthreshold <meters>        Meters (decimal) away an object point must be from the background to not be discarded");
        println!("  - reflthreshold <points>        Minimum reflectivity (decimal) a point must have to not be discarded");
    }
    if wants(CommandKind::Discard) {
        println!("discard <millisecs>            Discards points for the amount of milliseconds specified");
    }
    if wants(CommandKind::Object) {
        println!("object <...>                   Management of objects:");
        println!("  - describe <name>               Describes the object with the given name");
        println!("  - load <name> <file>            Loads the contents of a file as a new object with the given name");
        println!("  - save <name> <file>            Saves the object with the given name into a file");
        println!("  - csv <name> <file>             Saves the object with the given name into a file in csv format");
    }
    if wants(CommandKind::Model) {
        println!("model <...>                    Management of models:");
        println!("  - new <object> <new_model>      Creates a new model from an object with the given name");
        println!("  - describe <name>               Describes the model with the given name");
        println!("  - load <name> <file>            Loads the contents of a file as a new model with the given name");
        println!("  - save <name> <file>            Saves the model with the given name into a file");
        println!("  - csv <name> <file>             Saves the model with the given name into a file in csv format");
    }
    if wants(CommandKind::Info) {
        println!("info                           Prints the execution parameters currently in use");
    }
    if wants(CommandKind::List) {
        println!("list <...>                     List loaded/stored items:");
        println!("  - objects                       Created objects");
        println!("  - models                        Loaded models");
    }
    if wants(CommandKind::Analyze) {
        println!("analyze <object> <model>       Analyzes the differences between the specified object and model");
    }
}
