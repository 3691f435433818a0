//! TG (test graph) parser implementation.

use super::*;
use crate::core::error::CoalesceError;
use hashbrown::HashMap;

pub fn parse_graph(text: &str) -> CoalesceResult<TestGraph> {
    let mut parser = Parser::default();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        parser
            .parse_line(line)
            .map_err(|message| CoalesceError::Parse { line: idx + 1, message })?;
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    procedure: Option<String>,
    graph: Option<TestGraph>,
    nodes: HashMap<String, NodeIdx>,
}

impl Parser {
    fn parse_line(&mut self, line: &str) -> Result<(), String> {
        let mut words = line.split_whitespace();
        let keyword = words.next().ok_or("empty line")?;
        let args: Vec<&str> = words.collect();

        match keyword {
            "proc" => {
                let [name] = args.as_slice() else {
                    return Err("expected 'proc <name>'".to_string());
                };
                self.procedure = Some(name.to_string());
                Ok(())
            }
            "class" => self.parse_class(&args),
            "node" => self.parse_node(&args),
            "edge" => {
                let [a, b] = args.as_slice() else {
                    return Err("expected 'edge <a> <b>'".to_string());
                };
                let (a, b) = (self.lookup(a)?, self.lookup(b)?);
                self.graph_mut()?.add_edge(a, b);
                Ok(())
            }
            "aff" => {
                let [a, b, cost] = args.as_slice() else {
                    return Err("expected 'aff <a> <b> <cost>'".to_string());
                };
                let (a, b) = (self.lookup(a)?, self.lookup(b)?);
                let cost: u32 = cost
                    .parse()
                    .map_err(|_| format!("invalid affinity cost '{}'", cost))?;
                self.graph_mut()?.add_affinity(a, b, cost);
                Ok(())
            }
            other => Err(format!("unknown directive '{}'", other)),
        }
    }

    fn parse_class(&mut self, args: &[&str]) -> Result<(), String> {
        if self.graph.is_some() {
            return Err("register class already defined".to_string());
        }
        let Some((name, regs)) = args.split_first() else {
            return Err("expected 'class <name> <regs>...'".to_string());
        };
        if regs.is_empty() {
            return Err(format!("register class '{}' has no registers", name));
        }

        let regs = regs.iter().map(|r| match r.strip_prefix('!') {
            Some(reg) => (reg.to_string(), true),
            None => (r.to_string(), false),
        });
        let class = RegisterClass::new(*name, regs);
        let procedure = self.procedure.clone().unwrap_or_else(|| "anon".to_string());
        self.graph = Some(TestGraph::new(procedure, class));
        Ok(())
    }

    fn parse_node(&mut self, args: &[&str]) -> Result<(), String> {
        let Some((name, mut rest)) = args.split_first() else {
            return Err("expected 'node <name>'".to_string());
        };
        if self.nodes.contains_key(*name) {
            return Err(format!("node '{}' defined twice", name));
        }

        let graph = self.graph_mut()?;
        let n_regs = graph.register_class().n_regs();
        let reg_index = |graph: &TestGraph, reg: &str| {
            graph
                .register_class()
                .find(reg)
                .ok_or_else(|| format!("unknown register '{}'", reg))
        };

        let mut reg = None;
        if let ["=", r, tail @ ..] = rest {
            reg = Some(reg_index(graph, r)?);
            rest = tail;
        }

        let mut limited = None;
        let mut ignore = false;
        let mut in_limit = false;
        for word in rest {
            match *word {
                "limit" => {
                    in_limit = true;
                    limited.get_or_insert_with(|| RegSet::new(n_regs));
                }
                "ignore" => {
                    in_limit = false;
                    ignore = true;
                }
                r if in_limit => {
                    let idx = reg_index(graph, r)?;
                    if let Some(adm) = limited.as_mut() {
                        adm.set(idx);
                    }
                }
                other => return Err(format!("unexpected '{}' in node definition", other)),
            }
        }

        let idx = graph.add_node(*name, reg);
        if let Some(adm) = limited {
            graph.set_limited(idx, adm);
        }
        graph.set_ignored(idx, ignore);
        self.nodes.insert(name.to_string(), idx);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<NodeIdx, String> {
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| format!("unknown node '{}'", name))
    }

    fn graph_mut(&mut self) -> Result<&mut TestGraph, String> {
        self.graph
            .as_mut()
            .ok_or_else(|| "register class must be defined first".to_string())
    }

    fn finish(self) -> CoalesceResult<TestGraph> {
        self.graph.ok_or_else(|| CoalesceError::Parse {
            line: 0,
            message: "no register class defined".to_string(),
        })
    }
}
