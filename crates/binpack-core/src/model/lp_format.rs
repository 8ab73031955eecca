use super::*;
use std::fmt::Write;

const TERMS_PER_LINE: usize = 8;

impl Model {
    /// Writes the model in CPLEX LP format so it can be handed to any
    /// external solver that reads `.lp` files.
    pub fn write_lp<W: Write>(&self, out: &mut W) -> std::fmt::Result {
        writeln!(
            out,
            "\\ packing model: {} items, {} slots, {} variables, {} constraints",
            self.items.len(),
            self.slots.len(),
            self.variables.len(),
            self.constraints.len()
        )?;

        writeln!(out, "Minimize")?;
        write!(out, " obj:")?;
        if self.objective.is_empty() {
            if let Some(first) = self.variables.first() {
                write!(out, " 0 {}", first.name)?;
            }
        } else {
            self.write_terms(out, &self.objective)?;
        }
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for constraint in &self.constraints {
            write!(out, " {}:", constraint.name)?;
            self.write_terms(out, &constraint.terms)?;
            let sense = match constraint.sense {
                Sense::Le => "<=",
                Sense::Ge => ">=",
                Sense::Eq => "=",
            };
            writeln!(out, " {} {}", sense, constraint.rhs)?;
        }

        writeln!(out, "Bounds")?;
        for var in &self.variables {
            if var.kind == VarKind::Binary && var.lower == 0.0 && var.upper == 1.0 {
                continue;
            }
            if var.upper.is_finite() {
                writeln!(out, " {} <= {} <= {}", var.lower, var.name, var.upper)?;
            } else {
                writeln!(out, " {} >= {}", var.name, var.lower)?;
            }
        }

        writeln!(out, "Binaries")?;
        let binaries: Vec<&str> = self
            .variables
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .map(|v| v.name.as_str())
            .collect();
        for chunk in binaries.chunks(TERMS_PER_LINE) {
            writeln!(out, " {}", chunk.join(" "))?;
        }

        writeln!(out, "End")
    }

    pub fn to_lp_string(&self) -> String {
        let mut lp = String::new();
        // Writing into a String cannot fail
        let _ = self.write_lp(&mut lp);
        lp
    }

    fn write_terms<W: Write>(&self, out: &mut W, terms: &[(VarId, f64)]) -> std::fmt::Result {
        for (n, &(var, coeff)) in terms.iter().enumerate() {
            if n > 0 && n % TERMS_PER_LINE == 0 {
                write!(out, "\n   ")?;
            }
            let sign = if coeff < 0.0 { '-' } else { '+' };
            if n == 0 && sign == '+' {
                write!(out, " {} {}", coeff, self.variables[var.0].name)?;
            } else {
                write!(out, " {} {} {}", sign, coeff.abs(), self.variables[var.0].name)?;
            }
        }
        Ok(())
    }
}
